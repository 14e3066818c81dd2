use serde::{Deserialize, Serialize};

/// CSS selectors for a product page's review widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewSelectors {
    /// Present once the product page has rendered
    pub page_loaded: String,
    /// Wrapper of the review widget, scrolled into view to trigger lazy loading
    pub reviews_section: String,
    /// One review
    pub container: String,
    /// Title inside a review container
    pub title: String,
    /// Body text inside a review container
    pub content: String,
    /// "Show more" control inside truncated review content
    pub show_more: String,
    /// Next-page control of the review pager
    pub next_page: String,
}

impl Default for ReviewSelectors {
    fn default() -> Self {
        Self {
            page_loaded: "main".to_string(),
            reviews_section: "#customer-review-widget-id".to_string(),
            container: "div.review-comment".to_string(),
            title: "div.review-comment__title".to_string(),
            content: "div.review-comment__content".to_string(),
            show_more: "span.show-more-content".to_string(),
            next_page: "a.btn.next".to_string(),
        }
    }
}

impl ReviewSelectors {
    /// "Show more" controls scoped to review content blocks.
    pub fn show_more_in_content(&self) -> String {
        format!("{} {}", self.content, self.show_more)
    }
}
