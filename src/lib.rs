//! # pubcert
//!
//! Publication aggregation pipeline for academic certification reports.
//!
//! ## Modules
//!
//! - [`identifier`] - Classification and validation of user-entered identifiers
//! - [`backend`] - Certification backend API client and publication model
//! - [`aggregate`] - Fetch orchestration, deduplication, summary views
//! - [`session`] - Search state machine and presentation facade
//! - [`handoff`] - One-shot payload for the report-preview step
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pubcert::backend::{BackendClient, BackendConfig};
//! use pubcert::session::SearchSession;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = BackendClient::new(&BackendConfig::default())?;
//!     let mut session = SearchSession::new(client);
//!     let state = session.search(&["57190372620".to_string()]).await;
//!     if let Some(result) = state.result() {
//!         println!("Found {} publications", result.publications.len());
//!     }
//!     Ok(())
//! }
//! ```

pub mod aggregate;
pub mod backend;
pub mod error;
pub mod handoff;
pub mod identifier;
pub mod session;

pub use error::{PubcertError, Result};
