//! Review scraping for a single product page.
//!
//! # Architecture
//!
//! ```text
//! Task → Paginator → (PageExtractor per page) → Vec<ReviewRecord>
//! ```
//!
//! The [`Paginator`] is an explicit state machine; reaching the last page,
//! finding no reviews or timing out on the pager are normal terminal states,
//! not errors. Only a fatal session error ends a task as failed.
//!
//! # Usage
//!
//! ```rust,ignore
//! use reviewtap::scraper::{Paginator, ReviewSelectors};
//!
//! let paginator = Paginator::new(ReviewSelectors::default(), collector_config);
//! let report = paginator.run(&mut session, &task).await;
//! println!("{} reviews over {} pages", report.records.len(), report.pages);
//! ```

mod extractor;
mod paginator;
mod selectors;

pub use extractor::PageExtractor;
pub use paginator::{Outcome, PageEnd, Paginator, TaskReport};
pub use selectors::ReviewSelectors;
