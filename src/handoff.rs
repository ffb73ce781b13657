//! One-shot handoff to the report-preview step.
//!
//! The aggregation result is copied into a [`HandoffSlot`] once and consumed
//! exactly once by the downstream report-preview consumer. The slot is
//! explicit state composed by the caller, not an ambient shared store.

use crate::backend::{AuthorDescriptor, Publication};
use serde::Serialize;
use std::collections::BTreeMap;

/// Payload handed to the report-preview step.
#[derive(Debug, Clone, Serialize)]
pub struct ReportHandoff {
    /// Raw identifier strings as originally entered
    pub identifiers: Vec<String>,
    pub publications: Vec<Publication>,
    pub subject_areas: Vec<String>,
    pub documents_by_year: BTreeMap<String, usize>,
    pub author: Option<AuthorDescriptor>,
}

/// Holds at most one pending handoff payload.
#[derive(Debug, Default)]
pub struct HandoffSlot {
    payload: Option<ReportHandoff>,
}

impl HandoffSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a payload, replacing any unconsumed one.
    pub fn put(&mut self, payload: ReportHandoff) {
        self.payload = Some(payload);
    }

    /// Consume the pending payload, leaving the slot empty.
    pub fn take(&mut self) -> Option<ReportHandoff> {
        self.payload.take()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(marker: &str) -> ReportHandoff {
        ReportHandoff {
            identifiers: vec![marker.to_string()],
            publications: Vec::new(),
            subject_areas: Vec::new(),
            documents_by_year: BTreeMap::new(),
            author: None,
        }
    }

    #[test]
    fn test_take_consumes_exactly_once() {
        let mut slot = HandoffSlot::new();
        slot.put(payload("first"));

        let taken = slot.take().expect("payload present");
        assert_eq!(taken.identifiers, vec!["first".to_string()]);
        assert!(slot.take().is_none());
        assert!(slot.is_empty());
    }

    #[test]
    fn test_put_replaces_unconsumed_payload() {
        let mut slot = HandoffSlot::new();
        slot.put(payload("stale"));
        slot.put(payload("fresh"));

        let taken = slot.take().expect("payload present");
        assert_eq!(taken.identifiers, vec!["fresh".to_string()]);
    }
}
