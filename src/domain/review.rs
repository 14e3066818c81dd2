use std::collections::HashSet;

use serde::Serialize;

/// Placeholder for a field whose DOM node was absent.
pub const NOT_AVAILABLE: &str = "N/A";

/// Title and content read from one review container, before labelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReview {
    pub title: String,
    pub content: String,
}

impl RawReview {
    /// Build from optional node texts; a missing node becomes [`NOT_AVAILABLE`].
    pub fn from_parts(title: Option<String>, content: Option<String>) -> Self {
        Self {
            title: title.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            content: content.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        }
    }

    pub fn labelled(self, label: &str) -> ReviewRecord {
        ReviewRecord {
            title: self.title,
            content: self.content,
            label: label.to_string(),
        }
    }
}

/// One output row: a review tagged with its product's category label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ReviewRecord {
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub label: String,
}

impl ReviewRecord {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            label: label.into(),
        }
    }
}

/// Drop repeated (title, content, label) triples, keeping first occurrences.
pub fn dedup_records(records: Vec<ReviewRecord>) -> Vec<ReviewRecord> {
    let mut seen = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|r| seen.insert(r.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_parts_become_sentinel() {
        let raw = RawReview::from_parts(None, Some("Great".into()));
        assert_eq!(raw.title, NOT_AVAILABLE);
        assert_eq!(raw.content, "Great");

        let raw = RawReview::from_parts(Some("Ok".into()), None);
        assert_eq!(raw.content, NOT_AVAILABLE);
    }

    #[test]
    fn test_labelled_carries_label() {
        let record = RawReview::from_parts(Some("t".into()), Some("c".into())).labelled("phones");
        assert_eq!(record, ReviewRecord::new("t", "c", "phones"));
    }

    #[test]
    fn test_dedup_keeps_first_occurrence_order() {
        let records = vec![
            ReviewRecord::new("a", "1", "x"),
            ReviewRecord::new("b", "2", "x"),
            ReviewRecord::new("a", "1", "x"),
            ReviewRecord::new("a", "1", "y"),
        ];
        let unique = dedup_records(records);
        assert_eq!(
            unique,
            vec![
                ReviewRecord::new("a", "1", "x"),
                ReviewRecord::new("b", "2", "x"),
                ReviewRecord::new("a", "1", "y"),
            ]
        );
    }

    #[test]
    fn test_dedup_is_idempotent() {
        let records = vec![
            ReviewRecord::new("a", "1", "x"),
            ReviewRecord::new("a", "1", "x"),
            ReviewRecord::new("N/A", "N/A", "x"),
            ReviewRecord::new("N/A", "N/A", "x"),
        ];
        let once = dedup_records(records);
        let twice = dedup_records(once.clone());
        assert_eq!(once, twice);
        assert_eq!(once.len(), 2);
    }
}
