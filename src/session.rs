//! Search session state machine and presentation-layer facade.
//!
//! One session drives one consumer's aggregation lifecycle:
//! `Idle -> Fetching -> Succeeded | Failed`, back to `Fetching` on the next
//! search, back to `Idle` on an explicit clear. There is no cancelled state;
//! an in-flight operation runs to completion. `search` takes `&mut self`, so
//! a second search cannot start while one is in flight for the same session.

use crate::aggregate::{aggregate, AggregationResult};
use crate::backend::PublicationSource;
use crate::handoff::ReportHandoff;
use crate::identifier::{self, SourceIdValidation};
use tokio::sync::watch;

/// Operation-level state of a session.
#[derive(Debug, Clone, Default)]
pub enum SearchState {
    #[default]
    Idle,
    Fetching,
    Succeeded(AggregationResult),
    Failed(String),
}

impl SearchState {
    pub fn is_fetching(&self) -> bool {
        matches!(self, SearchState::Fetching)
    }

    /// The delivered result, when the last search succeeded.
    pub fn result(&self) -> Option<&AggregationResult> {
        match self {
            SearchState::Succeeded(result) => Some(result),
            _ => None,
        }
    }

    /// The surfaced error message, when the last search failed.
    pub fn error(&self) -> Option<&str> {
        match self {
            SearchState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Facade over the aggregation pipeline for one presentation-layer consumer.
pub struct SearchSession<S> {
    source: S,
    state: SearchState,
    identifiers: Vec<String>,
    progress: watch::Sender<String>,
}

impl<S: PublicationSource> SearchSession<S> {
    pub fn new(source: S) -> Self {
        let (progress, _) = watch::channel(String::new());
        Self {
            source,
            state: SearchState::Idle,
            identifiers: Vec::new(),
            progress,
        }
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    /// Subscribe to the incremental progress text emitted while fetching.
    pub fn progress(&self) -> watch::Receiver<String> {
        self.progress.subscribe()
    }

    /// Run a full aggregation for the given raw identifier strings.
    ///
    /// Replaces any previous result. Fatal errors land in
    /// [`SearchState::Failed`] with their user-facing message; per-identifier
    /// Scopus failures never do.
    pub async fn search(&mut self, raw_ids: &[String]) -> &SearchState {
        self.state = SearchState::Fetching;
        self.identifiers = raw_ids.to_vec();

        self.state = match aggregate(&self.source, raw_ids, &self.progress).await {
            Ok(result) => SearchState::Succeeded(result),
            Err(e) => SearchState::Failed(e.user_message()),
        };
        &self.state
    }

    /// Synchronous single-candidate Scopus-id check for live input feedback.
    pub fn validate_source_id(&self, raw: &str) -> SourceIdValidation {
        identifier::validate_source_id(raw)
    }

    /// Discard any result and return to the initial state.
    pub fn clear(&mut self) {
        self.state = SearchState::Idle;
        self.identifiers.clear();
        let _ = self.progress.send(String::new());
    }

    /// Build the one-shot payload for the report-preview step.
    ///
    /// Only available after a successful search; the caller places it into a
    /// [`crate::handoff::HandoffSlot`] of its choosing.
    pub fn handoff(&self) -> Option<ReportHandoff> {
        self.state.result().map(|result| ReportHandoff {
            identifiers: self.identifiers.clone(),
            publications: result.publications.clone(),
            subject_areas: result.subject_areas.clone(),
            documents_by_year: result.documents_by_year.clone(),
            author: result.author.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{AuthorLookup, Publication};
    use crate::error::{PubcertError, Result};
    use crate::handoff::HandoffSlot;

    /// Source returning one canned record per known Scopus id.
    struct FixedSource {
        known: Vec<String>,
    }

    impl PublicationSource for FixedSource {
        async fn by_author(&self, author_id: &str) -> Result<AuthorLookup> {
            Err(PubcertError::Api {
                code: 404,
                message: format!("author {} not found", author_id),
            })
        }

        async fn by_source_id(&self, source_id: &str) -> Result<Vec<Publication>> {
            if self.known.iter().any(|id| id == source_id) {
                Ok(vec![Publication {
                    scopus_id: format!("p-{}", source_id),
                    year: "2020".to_string(),
                    ..Default::default()
                }])
            } else {
                Err(PubcertError::Api {
                    code: 502,
                    message: "unavailable".to_string(),
                })
            }
        }
    }

    fn session() -> SearchSession<FixedSource> {
        SearchSession::new(FixedSource {
            known: vec!["12345678".to_string()],
        })
    }

    #[tokio::test]
    async fn test_successful_search_reaches_succeeded() {
        let mut session = session();
        assert!(matches!(session.state(), SearchState::Idle));

        let state = session.search(&["12345678".to_string()]).await;
        let result = state.result().expect("succeeded");
        assert_eq!(result.publications.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_search_then_new_search_recovers() {
        let mut session = session();

        session
            .search(&["11111111-1111-1111-1111-111111111111".to_string()])
            .await;
        assert_eq!(
            session.state().error(),
            Some("author lookup failed: author 11111111-1111-1111-1111-111111111111 not found")
        );

        session.search(&["12345678".to_string()]).await;
        assert!(session.state().result().is_some());
    }

    #[tokio::test]
    async fn test_no_valid_identifiers_message() {
        let mut session = session();
        session.search(&["abc".to_string()]).await;
        assert_eq!(session.state().error(), Some("no valid identifiers provided"));
    }

    #[tokio::test]
    async fn test_clear_returns_to_idle_and_drops_result() {
        let mut session = session();
        session.search(&["12345678".to_string()]).await;
        assert!(session.state().result().is_some());

        session.clear();
        assert!(matches!(session.state(), SearchState::Idle));
        assert!(session.handoff().is_none());
    }

    #[tokio::test]
    async fn test_handoff_carries_original_identifiers() {
        let mut session = session();
        let raw = vec!["12345678".to_string()];
        session.search(&raw).await;

        let mut slot = HandoffSlot::new();
        let payload = session.handoff().expect("handoff after success");
        slot.put(payload);

        let taken = slot.take().expect("consumed once");
        assert_eq!(taken.identifiers, raw);
        assert_eq!(taken.publications.len(), 1);
    }

    #[test]
    fn test_validate_delegates_to_validator() {
        let session = session();
        assert!(session.validate_source_id("12345678").valid);
        assert!(!session.validate_source_id("abc").valid);
    }
}
