use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where categories and products are found on the site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Page listing the categories
    pub home_url: String,

    /// Close control of the promotional pop-up on the home page
    pub popup_close: String,

    /// Blocks that may hold category links
    pub category_block: String,

    /// Heading element inside a block
    pub category_heading: String,

    /// Only blocks whose heading reads exactly this are used
    pub category_heading_text: String,

    /// Product anchors on a category page
    pub product_link: String,

    /// "Load more" control of a category page
    pub load_more: String,

    /// Presses of the "load more" control per category (default: 0)
    pub max_load_more: usize,

    pub load_more_settle_ms: u64,

    /// Pause after opening a category page
    pub category_settle_ms: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            home_url: "https://tiki.vn/".to_string(),
            popup_close: "img[alt='close-icon']".to_string(),
            category_block: "div.sc-cffe1c5-0.bKBPyH".to_string(),
            category_heading: "div".to_string(),
            category_heading_text: "Danh mục".to_string(),
            product_link: "a.product-item".to_string(),
            load_more: "div[data-view-id='category_infinity_view.more']".to_string(),
            max_load_more: 0,
            load_more_settle_ms: 3_000,
            category_settle_ms: 2_000,
        }
    }
}

impl DiscoveryConfig {
    pub fn load_more_settle(&self) -> Duration {
        Duration::from_millis(self.load_more_settle_ms)
    }

    pub fn category_settle(&self) -> Duration {
        Duration::from_millis(self.category_settle_ms)
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self {
            home_url: "https://shop.test/".to_string(),
            load_more_settle_ms: 0,
            category_settle_ms: 0,
            ..Self::default()
        }
    }
}
