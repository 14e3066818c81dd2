//! # reviewtap
//!
//! Collects product reviews from an online shop by driving headless Chrome.
//!
//! ## Architecture
//!
//! ```text
//! home page → categories → products → WorkQueue → workers (Paginator + PageExtractor) → reviews.csv
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! # Everything, using ./data for intermediate files
//! reviewtap run
//!
//! # Only the review step, from an existing product list
//! reviewtap --workers 8 reviews -i data/url_final.csv -o data/raw_data.csv
//! ```

/// Application context and error handling.
///
/// [`AppContext`](app::AppContext) holds the effective configuration and
/// resolves the data and log file locations.
pub mod app;

/// Browser sessions behind the [`Session`](browser::Session) trait.
///
/// - [`ChromeSession`](browser::ChromeSession): chromiumoxide implementation
/// - [`wait`](browser::wait): bounded polling helpers
pub mod browser;

/// Command-line interface using clap.
///
/// - `categories` - find category pages
/// - `products` - list products per category
/// - `reviews` - scrape reviews for a product list
/// - `run` - all three in sequence
/// - `config` - print the effective configuration
pub mod cli;

/// Worker pool, work queue, result sink and batch driver.
pub mod collector;

/// Configuration file handling.
///
/// Loads from `~/.config/reviewtap/config.toml`, writing a commented default
/// on first use.
pub mod config;

/// Category and product discovery.
pub mod discover;

/// Core domain models: [`Task`](domain::Task) and
/// [`ReviewRecord`](domain::ReviewRecord).
pub mod domain;

/// Console and rotating file logging.
pub mod logging;

/// Review page extraction and pagination.
pub mod scraper;

/// CSV task lists and review tables.
pub mod table;
