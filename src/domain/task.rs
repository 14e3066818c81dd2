use crate::domain::review::NOT_AVAILABLE;

/// One product page to scrape, tagged with the category it came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Task {
    pub url: String,
    pub label: String,
}

impl Task {
    pub fn new(url: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            label: label.into(),
        }
    }

    /// A task whose category is unknown.
    pub fn unlabelled(url: impl Into<String>) -> Self {
        Self::new(url, NOT_AVAILABLE)
    }
}
