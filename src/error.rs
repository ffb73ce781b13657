//! Custom error types for pubcert.
//!
//! This module defines all error types used throughout the application.
//! All functions return `Result<T, PubcertError>` instead of using `unwrap()`.

use thiserror::Error;

/// Generic message shown when an error has no user-safe text of its own.
pub const FALLBACK_MESSAGE: &str = "an unexpected error occurred";

/// Main error type for pubcert operations.
///
/// Uses `thiserror` for ergonomic error handling and automatic `Display` implementation.
#[derive(Debug, Error)]
pub enum PubcertError {
    /// None of the supplied identifier strings classified as an author id or a Scopus author id
    #[error("no valid identifiers provided")]
    NoValidIdentifiers,

    /// A by-author lookup failed; fatal, aborts the whole aggregation
    #[error("author lookup failed: {0}")]
    AuthorFetch(String),

    /// A by-source-id lookup failed; logged and skipped, never surfaced
    #[error("Scopus lookup failed for {id}: {message}")]
    SourceFetch {
        /// The Scopus author id whose lookup failed
        id: String,
        /// Underlying failure text
        message: String,
    },

    /// Network/HTTP request error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Backend returned an error response
    #[error("API error: {code} - {message}")]
    Api {
        /// HTTP status code from the backend
        code: i32,
        /// Error message from the backend body
        message: String,
    },

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),
}

impl PubcertError {
    /// Text safe to show to an end user.
    ///
    /// Fatal pipeline errors carry the backend's own message verbatim;
    /// infrastructure errors collapse to [`FALLBACK_MESSAGE`].
    pub fn user_message(&self) -> String {
        match self {
            PubcertError::NoValidIdentifiers
            | PubcertError::AuthorFetch(_)
            | PubcertError::Api { .. }
            | PubcertError::Config(_) => self.to_string(),
            _ => FALLBACK_MESSAGE.to_string(),
        }
    }
}

/// Result type alias using `PubcertError`
pub type Result<T> = std::result::Result<T, PubcertError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_author_fetch_message_is_verbatim() {
        let err = PubcertError::AuthorFetch("author 1234 not found".to_string());
        assert_eq!(
            err.user_message(),
            "author lookup failed: author 1234 not found"
        );
    }

    #[test]
    fn test_infrastructure_errors_fall_back() {
        let err = PubcertError::Io(std::io::Error::other("disk gone"));
        assert_eq!(err.user_message(), FALLBACK_MESSAGE);
    }
}
