//! Publication aggregation pipeline.
//!
//! Takes a mixed list of raw identifier strings, fetches publication records
//! for each classified identifier from a [`PublicationSource`], merges them
//! into one deduplicated collection, and derives the two summary views used
//! for reporting (subject-area set, documents-per-year histogram).
//!
//! Fetches are strictly sequential: author ids first in input order, then
//! Scopus ids in input order, one request in flight at a time. An author
//! lookup failure aborts the whole operation; a Scopus lookup failure is
//! logged and skipped, so partial results are possible for Scopus ids only.

use crate::backend::{AuthorDescriptor, Publication, PublicationSource};
use crate::error::{PubcertError, Result};
use crate::identifier;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::LazyLock;
use tokio::sync::watch;
use tracing::{error, info, warn};

static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(19|20)\d{2}\b").expect("valid regex"));

/// Output of one aggregation run.
///
/// Invariants: every publication carries a unique `scopus_id`; the sum of
/// `documents_by_year` counts equals the number of publications with a
/// resolvable year.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregationResult {
    /// Deduplicated publications, in first-encounter order
    pub publications: Vec<Publication>,
    /// Distinct subject-area labels, sorted ascending
    pub subject_areas: Vec<String>,
    /// Count of publications per resolvable year
    pub documents_by_year: BTreeMap<String, usize>,
    /// Resolved author from the first successful by-author lookup, if any
    pub author: Option<AuthorDescriptor>,
}

/// Run the full aggregation for a mixed list of raw identifier strings.
///
/// Progress text (the identifier currently being fetched) is published on
/// `progress` as a side channel for UI display; it is not part of the result.
///
/// # Errors
///
/// * [`PubcertError::NoValidIdentifiers`] when nothing classifies, before any fetch
/// * [`PubcertError::AuthorFetch`] when any by-author lookup fails
pub async fn aggregate<S: PublicationSource>(
    source: &S,
    raw_ids: &[String],
    progress: &watch::Sender<String>,
) -> Result<AggregationResult> {
    let classified = identifier::classify(raw_ids);
    if classified.is_empty() {
        return Err(PubcertError::NoValidIdentifiers);
    }

    info!(
        authors = classified.author_ids.len(),
        scopus_ids = classified.source_ids.len(),
        "Starting aggregation"
    );

    let mut working: Vec<Publication> = Vec::new();
    let mut resolved_author: Option<AuthorDescriptor> = None;

    for author_id in &classified.author_ids {
        let _ = progress.send(format!("Fetching publications for author {}", author_id));

        let lookup = source.by_author(author_id).await.map_err(|e| {
            error!(author_id = %author_id, error = %e, "Author lookup failed, aborting");
            PubcertError::AuthorFetch(fetch_message(e))
        })?;

        if resolved_author.is_none() {
            resolved_author = lookup.author;
        }
        working.extend(lookup.publications);
    }

    // Duplicate Scopus ids in the input are fetched once per occurrence;
    // only the resulting records are deduplicated.
    for source_id in &classified.source_ids {
        let _ = progress.send(format!("Fetching publications for Scopus id {}", source_id));

        match source.by_source_id(source_id).await {
            Ok(publications) => working.extend(publications),
            Err(e) => {
                let skipped = PubcertError::SourceFetch {
                    id: source_id.clone(),
                    message: fetch_message(e),
                };
                warn!(source_id = %source_id, error = %skipped, "Skipping failed Scopus lookup");
            }
        }
    }

    let fetched = working.len();
    let publications = dedup_publications(working);
    let subject_areas = collect_subject_areas(&publications);
    let documents_by_year = count_by_year(&publications);

    info!(
        fetched = fetched,
        unique = publications.len(),
        "Aggregation complete"
    );
    let _ = progress.send(format!("Aggregated {} unique publications", publications.len()));

    Ok(AggregationResult {
        publications,
        subject_areas,
        documents_by_year,
        author: resolved_author,
    })
}

/// Prefer the backend's own message over our error wrapper text.
fn fetch_message(e: PubcertError) -> String {
    match e {
        PubcertError::Api { message, .. } => message,
        other => other.to_string(),
    }
}

/// Collapse the working list to one record per unique `scopus_id`, keeping
/// the first occurrence in encounter order.
pub fn dedup_publications(records: Vec<Publication>) -> Vec<Publication> {
    let mut seen: HashSet<String> = HashSet::with_capacity(records.len());
    let mut unique = Vec::with_capacity(records.len());
    for record in records {
        if seen.insert(record.scopus_id.clone()) {
            unique.push(record);
        }
    }
    unique
}

/// Union of all subject-area labels, sorted ascending, no duplicates.
pub fn collect_subject_areas(publications: &[Publication]) -> Vec<String> {
    let set: BTreeSet<String> = publications
        .iter()
        .flat_map(|p| p.subject_areas.iter().cloned())
        .collect();
    set.into_iter().collect()
}

/// Count publications per resolvable year. Records without a usable year
/// are left out of the map; no zero-filling for absent years.
pub fn count_by_year(publications: &[Publication]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for publication in publications {
        if let Some(year) = resolve_year(&publication.year) {
            *counts.entry(year).or_insert(0) += 1;
        }
    }
    counts
}

/// Normalize a year-like value to the string key used in the histogram.
///
/// All-digit values are used as-is; otherwise the first embedded 19xx/20xx
/// run is taken; anything else has no resolvable year.
pub fn resolve_year(raw: &str) -> Option<String> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().all(|c| c.is_ascii_digit()) {
        return Some(s.to_string());
    }
    YEAR_RE.find(s).map(|m| m.as_str().to_string())
}
