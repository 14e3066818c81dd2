use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::browser::wait::Wait;

/// Worker pool sizing and the timing of every bounded wait in a scrape
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Concurrent workers, each with its own browser (default: 4)
    pub workers: usize,

    /// Wait for the product page and for new reviews after paging, in milliseconds (default: 15000)
    pub page_load_timeout_ms: u64,

    /// Wait for the review list and the next-page control, in milliseconds (default: 3000)
    pub short_wait_ms: u64,

    /// Polling interval of every bounded wait, in milliseconds (default: 250)
    pub poll_interval_ms: u64,

    /// Pause between scrolling a "show more" control into view and clicking it (default: 200)
    pub expand_settle_ms: u64,

    /// Pause after expanding one truncated review (default: 500)
    pub after_expand_ms: u64,

    /// Pause between scrolling the next-page control into view and clicking it (default: 300)
    pub click_settle_ms: u64,

    /// Pause after a new review page appeared (default: 500)
    pub page_settle_ms: u64,

    /// Pause before a worker takes its next task (default: 1000)
    pub task_delay_ms: u64,

    /// How long one dequeue attempt waits, in milliseconds (default: 1000)
    pub dequeue_timeout_ms: u64,

    /// How long to wait for each worker to exit after the queue drained, in seconds (default: 60)
    pub join_timeout_secs: u64,

    /// Stop paging a product after this many review pages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<usize>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            page_load_timeout_ms: 15_000,
            short_wait_ms: 3_000,
            poll_interval_ms: 250,
            expand_settle_ms: 200,
            after_expand_ms: 500,
            click_settle_ms: 300,
            page_settle_ms: 500,
            task_delay_ms: 1_000,
            dequeue_timeout_ms: 1_000,
            join_timeout_secs: 60,
            max_pages: None,
        }
    }
}

impl CollectorConfig {
    fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn page_load_wait(&self) -> Wait {
        Wait::new(Duration::from_millis(self.page_load_timeout_ms), self.poll_interval())
    }

    pub fn short_wait(&self) -> Wait {
        Wait::new(Duration::from_millis(self.short_wait_ms), self.poll_interval())
    }

    pub fn expand_settle(&self) -> Duration {
        Duration::from_millis(self.expand_settle_ms)
    }

    pub fn after_expand(&self) -> Duration {
        Duration::from_millis(self.after_expand_ms)
    }

    pub fn click_settle(&self) -> Duration {
        Duration::from_millis(self.click_settle_ms)
    }

    pub fn page_settle(&self) -> Duration {
        Duration::from_millis(self.page_settle_ms)
    }

    pub fn task_delay(&self) -> Duration {
        Duration::from_millis(self.task_delay_ms)
    }

    pub fn dequeue_timeout(&self) -> Duration {
        Duration::from_millis(self.dequeue_timeout_ms)
    }

    pub fn join_timeout(&self) -> Duration {
        Duration::from_secs(self.join_timeout_secs)
    }

    /// Millisecond-scale timings for exercising the pipeline against in-memory pages.
    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self {
            workers: 2,
            page_load_timeout_ms: 80,
            short_wait_ms: 40,
            poll_interval_ms: 5,
            expand_settle_ms: 0,
            after_expand_ms: 0,
            click_settle_ms: 0,
            page_settle_ms: 0,
            task_delay_ms: 0,
            dequeue_timeout_ms: 20,
            join_timeout_secs: 5,
            max_pages: None,
        }
    }
}
