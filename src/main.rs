//! pubcert - Publication Aggregation Pipeline
//!
//! A Rust microservice around the certification backend: fetches publication
//! records for author/Scopus identifiers, deduplicates them, and derives the
//! summary views used for certification reports.
//!
//! ## Usage
//!
//! ### CLI Mode
//! ```bash
//! pubcert search 57190372620 11111111-2222-3333-4444-555555555555
//! ```
//!
//! ### HTTP Server Mode
//! ```bash
//! pubcert serve --port 3000
//! ```

use anyhow::{Context, Result};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use clap::{Parser, Subcommand};
use pubcert::aggregate::{aggregate, AggregationResult};
use pubcert::backend::{AuthorDescriptor, BackendClient, BackendConfig, Publication, DEFAULT_BASE_URL};
use pubcert::identifier::{self, SourceIdValidation};
use pubcert::session::SearchSession;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// Publication aggregation pipeline for academic certification reports
#[derive(Parser)]
#[command(name = "pubcert")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, deduplicate, and summarize publications for identifiers
    Search {
        /// Author keys and/or Scopus author ids, in any order
        #[arg(required = true)]
        identifiers: Vec<String>,

        /// Certification backend base URL
        #[arg(long, default_value = DEFAULT_BASE_URL)]
        base_url: String,

        /// Per-request timeout in seconds
        #[arg(long, default_value = "60")]
        timeout: u64,

        /// Output directory for the CSV export
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,
    },

    /// Check one candidate Scopus author id
    Validate {
        /// The value to check
        value: String,
    },

    /// Run as HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Certification backend base URL
        #[arg(long, default_value = DEFAULT_BASE_URL)]
        base_url: String,

        /// Per-request timeout in seconds
        #[arg(long, default_value = "60")]
        timeout: u64,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .init();

    match cli.command {
        Commands::Search {
            identifiers,
            base_url,
            timeout,
            output,
        } => run_search(identifiers, base_url, timeout, output).await,
        Commands::Validate { value } => run_validate(&value),
        Commands::Serve {
            port,
            host,
            base_url,
            timeout,
        } => run_server(host, port, base_url, timeout).await,
    }
}

// ============================================================================
// Search
// ============================================================================

async fn run_search(
    identifiers: Vec<String>,
    base_url: String,
    timeout: u64,
    output_dir: PathBuf,
) -> Result<()> {
    let config = BackendConfig {
        base_url,
        timeout: Duration::from_secs(timeout),
    };
    let client = BackendClient::new(&config)?;
    let mut session = SearchSession::new(client);

    // Echo the orchestrator's progress side channel to the terminal
    let mut progress = session.progress();
    let printer = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let text = progress.borrow_and_update().clone();
            if !text.is_empty() {
                println!("  {}", text);
            }
        }
    });

    println!("Aggregating publications for {} identifier(s)...", identifiers.len());
    session.search(&identifiers).await;

    let result = match session.state().result() {
        Some(result) => result.clone(),
        None => {
            let message = session
                .state()
                .error()
                .unwrap_or("aggregation did not produce a result")
                .to_string();
            drop(session);
            let _ = printer.await;
            anyhow::bail!("{}", message);
        }
    };
    drop(session);
    let _ = printer.await;

    print_summary(&result);

    // Export the deduplicated list
    let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let output_folder = output_dir.join(timestamp);
    std::fs::create_dir_all(&output_folder).context("Failed to create output directory")?;

    let rows: Vec<PublicationRow> = result.publications.iter().map(PublicationRow::from).collect();
    let csv_path = output_folder.join("publications.csv");
    save_csv(&csv_path, &rows)?;

    Ok(())
}

fn print_summary(result: &AggregationResult) {
    println!("\nPublications: {}", result.publications.len());

    if let Some(author) = &result.author {
        println!("Author: {} ({})", author.name, author.affiliation);
    }

    if !result.subject_areas.is_empty() {
        println!("Subject areas: {}", result.subject_areas.join(", "));
    }

    if !result.documents_by_year.is_empty() {
        println!("\nDocuments by year:");
        for (year, count) in &result.documents_by_year {
            println!("  {}: {}", year, count);
        }
    }
}

/// Flat CSV row; subject areas joined into one cell
#[derive(Debug, Serialize)]
struct PublicationRow {
    scopus_id: String,
    title: String,
    year: String,
    source: String,
    document_type: String,
    affiliation: String,
    doi: String,
    subject_areas: String,
}

impl From<&Publication> for PublicationRow {
    fn from(publication: &Publication) -> Self {
        PublicationRow {
            scopus_id: publication.scopus_id.clone(),
            title: publication.title.clone(),
            year: publication.year.clone(),
            source: publication.source.clone(),
            document_type: publication.document_type.clone(),
            affiliation: publication.affiliation.clone(),
            doi: publication.doi.clone(),
            subject_areas: publication.subject_areas.join("; "),
        }
    }
}

/// Save data to CSV file
fn save_csv<T: Serialize>(path: &std::path::Path, data: &[T]) -> Result<()> {
    if data.is_empty() {
        println!("No data to save to {:?}", path);
        return Ok(());
    }

    let mut wtr = csv::WriterBuilder::new()
        .has_headers(true)
        .from_path(path)
        .context("Failed to create CSV writer")?;

    for item in data {
        wtr.serialize(item).context("Failed to write CSV record")?;
    }

    wtr.flush().context("Failed to flush CSV")?;
    println!("Saved: {:?}", path);
    Ok(())
}

// ============================================================================
// Validate
// ============================================================================

fn run_validate(value: &str) -> Result<()> {
    let validation = identifier::validate_source_id(value);
    if validation.valid {
        println!("valid");
    } else {
        println!(
            "invalid: {}",
            validation.reason.unwrap_or_else(|| "unknown reason".to_string())
        );
    }
    Ok(())
}

// ============================================================================
// HTTP Server
// ============================================================================

async fn run_server(host: String, port: u16, base_url: String, timeout: u64) -> Result<()> {
    info!(host = %host, port = port, backend = %base_url, "Starting HTTP server");

    let config = BackendConfig {
        base_url,
        timeout: Duration::from_secs(timeout),
    };
    let backend = BackendClient::new(&config)?;
    let app_state = Arc::new(AppState { backend });

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/aggregate", post(aggregate_handler))
        .route("/validate", post(validate_handler))
        .layer(tower_http::cors::CorsLayer::permissive())
        .with_state(app_state);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .context("Invalid host:port")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    println!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}

struct AppState {
    backend: BackendClient,
}

/// Health check endpoint
async fn health_handler() -> &'static str {
    "OK"
}

/// Aggregate request body
#[derive(Debug, Deserialize)]
struct AggregateRequest {
    identifiers: Vec<String>,
}

/// Aggregate response
#[derive(Debug, Serialize)]
struct AggregateResponse {
    status: String,
    count: usize,
    publications: Vec<Publication>,
    subject_areas: Vec<String>,
    documents_by_year: BTreeMap<String, usize>,
    author: Option<AuthorDescriptor>,
}

/// Aggregation endpoint handler
async fn aggregate_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AggregateRequest>,
) -> Json<AggregateResponse> {
    info!(identifiers = req.identifiers.len(), "Aggregate request");

    // Progress is not exposed over HTTP; the channel just satisfies the
    // orchestrator's side-channel contract
    let (progress, _guard) = watch::channel(String::new());

    match aggregate(&state.backend, &req.identifiers, &progress).await {
        Ok(result) => Json(AggregateResponse {
            status: "success".to_string(),
            count: result.publications.len(),
            publications: result.publications,
            subject_areas: result.subject_areas,
            documents_by_year: result.documents_by_year,
            author: result.author,
        }),
        Err(e) => {
            error!(error = %e, "Aggregation failed");
            Json(AggregateResponse {
                status: format!("error: {}", e.user_message()),
                count: 0,
                publications: vec![],
                subject_areas: vec![],
                documents_by_year: BTreeMap::new(),
                author: None,
            })
        }
    }
}

/// Validate request body
#[derive(Debug, Deserialize)]
struct ValidateRequest {
    value: String,
}

/// Single-candidate validation endpoint handler
async fn validate_handler(Json(req): Json<ValidateRequest>) -> Json<SourceIdValidation> {
    Json(identifier::validate_source_id(&req.value))
}
