//! Certification backend API client.
//!
//! The remote backend wraps the actual Scopus lookups; this module consumes
//! its two publication endpoints and converts the wire shapes into the
//! domain [`Publication`] model. The [`PublicationSource`] trait is the seam
//! the orchestrator is written against, so tests can substitute an in-memory
//! source for the HTTP client.

use crate::error::{PubcertError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Default backend base URL
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

/// Default per-request timeout; Scopus lookups are slow upstream
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// One bibliographic entry as used throughout the pipeline.
///
/// Immutable once fetched; the pipeline only filters and aggregates.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Publication {
    /// Unique per-publication Scopus identifier; the dedup key
    pub scopus_id: String,
    pub title: String,
    /// Year-like string, possibly empty
    pub year: String,
    /// Journal/venue name
    pub source: String,
    pub document_type: String,
    pub affiliation: String,
    /// DOI, empty when the record has none
    pub doi: String,
    /// Subject-area labels assigned by Scopus
    pub subject_areas: Vec<String>,
}

/// Resolved author info returned by the by-author endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthorDescriptor {
    pub id: String,
    pub name: String,
    pub affiliation: String,
}

/// Result of one by-author lookup.
#[derive(Debug, Clone, Default)]
pub struct AuthorLookup {
    pub author: Option<AuthorDescriptor>,
    pub publications: Vec<Publication>,
}

/// Source of publication records, keyed by either identifier kind.
///
/// Implemented by [`BackendClient`] for the real backend and by in-memory
/// stubs in tests.
pub trait PublicationSource {
    /// Fetch all publications registered for an internal author key.
    fn by_author(&self, author_id: &str) -> impl std::future::Future<Output = Result<AuthorLookup>> + Send;

    /// Fetch all publications for a numeric Scopus author id.
    fn by_source_id(&self, source_id: &str) -> impl std::future::Future<Output = Result<Vec<Publication>>> + Send;
}

/// Configuration for the backend client.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL of the certification backend API
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// HTTP client for the certification backend.
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// Create a new client for the given configuration.
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| PubcertError::Config(format!("Invalid base URL {}: {}", config.base_url, e)))?;

        let client = reqwest::Client::builder()
            .user_agent("pubcert/0.1")
            .timeout(config.timeout)
            .build()
            .map_err(|e| PubcertError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base.as_str().trim_end_matches('/').to_string(),
        })
    }

    /// Issue one GET and decode the body as `T`, surfacing non-2xx bodies
    /// as [`PubcertError::Api`] so the backend's own message reaches callers.
    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!(url = %url, "Fetching from backend");

        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                body.trim().to_string()
            };
            warn!(status = status.as_u16(), error = %message, "Backend error");
            return Err(PubcertError::Api {
                code: status.as_u16() as i32,
                message,
            });
        }

        Ok(response.json().await?)
    }
}

impl PublicationSource for BackendClient {
    async fn by_author(&self, author_id: &str) -> Result<AuthorLookup> {
        let url = format!("{}/publications/author/{}", self.base_url, author_id);
        let raw: AuthorPublicationsResponse = self.get_json(&url).await?;

        let lookup = AuthorLookup {
            author: raw.author.map(AuthorDescriptor::from),
            publications: raw.publications.into_iter().map(Publication::from).collect(),
        };
        info!(
            author_id = author_id,
            count = lookup.publications.len(),
            "Author lookup complete"
        );
        Ok(lookup)
    }

    async fn by_source_id(&self, source_id: &str) -> Result<Vec<Publication>> {
        let url = format!("{}/publications/scopus/{}", self.base_url, source_id);
        let raw: Vec<PublicationDto> = self.get_json(&url).await?;

        let publications: Vec<Publication> = raw.into_iter().map(Publication::from).collect();
        info!(
            source_id = source_id,
            count = publications.len(),
            "Scopus lookup complete"
        );
        Ok(publications)
    }
}

// === Backend wire types ===

#[derive(Debug, Deserialize)]
struct AuthorPublicationsResponse {
    #[serde(default)]
    author: Option<AuthorDto>,
    #[serde(default)]
    publications: Vec<PublicationDto>,
}

#[derive(Debug, Deserialize)]
struct AuthorDto {
    id: Option<String>,
    name: Option<String>,
    affiliation: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PublicationDto {
    #[serde(rename = "scopusId")]
    scopus_id: Option<String>,
    title: Option<String>,
    year: Option<serde_json::Value>,
    source: Option<String>,
    #[serde(rename = "documentType")]
    document_type: Option<String>,
    affiliation: Option<String>,
    doi: Option<String>,
    #[serde(rename = "subjectAreas", default)]
    subject_areas: Vec<String>,
}

impl From<AuthorDto> for AuthorDescriptor {
    fn from(raw: AuthorDto) -> Self {
        AuthorDescriptor {
            id: raw.id.unwrap_or_default(),
            name: raw.name.unwrap_or_default(),
            affiliation: raw.affiliation.unwrap_or_default(),
        }
    }
}

impl From<PublicationDto> for Publication {
    fn from(raw: PublicationDto) -> Self {
        // The backend serializes year as either a number or a string
        let year = match raw.year {
            Some(serde_json::Value::Number(n)) => n.to_string(),
            Some(serde_json::Value::String(s)) => s,
            _ => String::new(),
        };

        Publication {
            scopus_id: raw.scopus_id.unwrap_or_default(),
            title: raw.title.unwrap_or_default(),
            year,
            source: raw.source.unwrap_or_default(),
            document_type: raw.document_type.unwrap_or_default(),
            affiliation: raw.affiliation.unwrap_or_default(),
            doi: raw.doi.unwrap_or_default(),
            subject_areas: raw
                .subject_areas
                .into_iter()
                .filter(|s| !s.trim().is_empty())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_publication_dto_with_numeric_year() {
        let json = r#"{
            "scopusId": "2-s2.0-85012345678",
            "title": "Deep learning for slope stability",
            "year": 2021,
            "source": "Engineering Geology",
            "documentType": "Article",
            "affiliation": "Univ. of Testing",
            "doi": "10.1234/test",
            "subjectAreas": ["Geology", "", "Computer Science"]
        }"#;

        let dto: PublicationDto = serde_json::from_str(json).expect("valid dto");
        let publication = Publication::from(dto);

        assert_eq!(publication.scopus_id, "2-s2.0-85012345678");
        assert_eq!(publication.year, "2021");
        assert_eq!(publication.doi, "10.1234/test");
        // Blank labels from the backend are dropped
        assert_eq!(publication.subject_areas, vec!["Geology", "Computer Science"]);
    }

    #[test]
    fn test_parse_publication_dto_with_missing_fields() {
        let dto: PublicationDto = serde_json::from_str(r#"{"title": "Untitled"}"#).expect("valid dto");
        let publication = Publication::from(dto);

        assert_eq!(publication.title, "Untitled");
        assert_eq!(publication.scopus_id, "");
        assert_eq!(publication.year, "");
        assert!(publication.subject_areas.is_empty());
    }

    #[test]
    fn test_parse_author_response() {
        let json = r#"{
            "author": {"id": "a-1", "name": "J. Doe", "affiliation": "Univ. of Testing"},
            "publications": [{"scopusId": "p-1", "year": "2019"}]
        }"#;

        let raw: AuthorPublicationsResponse = serde_json::from_str(json).expect("valid response");
        assert_eq!(raw.author.as_ref().and_then(|a| a.name.as_deref()), Some("J. Doe"));
        assert_eq!(raw.publications.len(), 1);
    }

    #[test]
    fn test_parse_author_response_without_author() {
        let raw: AuthorPublicationsResponse =
            serde_json::from_str(r#"{"publications": []}"#).expect("valid response");
        assert!(raw.author.is_none());
        assert!(raw.publications.is_empty());
    }
}
