//! Configuration management for reviewtap.
//!
//! Configuration is read from `~/.config/reviewtap/config.toml` unless a path
//! is given on the command line. If the default file doesn't exist, a default
//! configuration with comments is created.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::browser::SessionConfig;
use crate::collector::CollectorConfig;
use crate::discover::DiscoveryConfig;
use crate::scraper::ReviewSelectors;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub browser: SessionConfig,
    pub collector: CollectorConfig,
    pub selectors: ReviewSelectors,
    pub discovery: DiscoveryConfig,
    pub paths: PathsConfig,
    pub logging: LoggingConfig,
}

/// File locations and table column names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
    pub logs_dir: PathBuf,
    /// Category URLs found on the home page
    pub categories_file: PathBuf,
    /// Product URLs with their category label; input of the review collector
    pub products_file: PathBuf,
    /// Collected reviews
    pub reviews_file: PathBuf,
    pub url_column: String,
    pub label_column: String,
    /// Prefix output tables with a UTF-8 byte order mark
    pub excel_bom: bool,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            logs_dir: PathBuf::from("logs"),
            categories_file: PathBuf::from("urls.csv"),
            products_file: PathBuf::from("url_final.csv"),
            reviews_file: PathBuf::from("raw_data.csv"),
            url_column: "URL".to_string(),
            label_column: "detail".to_string(),
            excel_bom: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rotation {
    Daily,
    Hourly,
    Never,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is not set
    pub level: String,
    pub file_name: String,
    pub rotation: Rotation,
    /// Mirror log lines to stderr
    pub console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_name: "reviewtap.log".to_string(),
            rotation: Rotation::Daily,
            console: true,
        }
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// If the config file exists but is invalid, returns an error.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, which must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path: `~/.config/reviewtap/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("reviewtap").join("config.toml"))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.collector.workers == 0 {
            return Err(ConfigError::Invalid(
                "collector.workers must be at least 1".to_string(),
            ));
        }
        if self.paths.url_column.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "paths.url_column must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Create a default config file with comments.
    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# reviewtap configuration
#
# Durations ending in _ms are milliseconds, _secs are seconds.

[browser]
# Run Chrome without a visible window
headless = true
window_width = 1920
window_height = 1080
disable_notifications = true
user_agent = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/98.0.4758.102 Safari/537.36"
# Additional Chrome command-line flags
extra_args = []
launch_timeout_secs = 30
navigation_timeout_secs = 60

[collector]
# Concurrent browser sessions
workers = 4
page_load_timeout_ms = 15000
short_wait_ms = 3000
poll_interval_ms = 250
expand_settle_ms = 200
after_expand_ms = 500
click_settle_ms = 300
page_settle_ms = 500
# Pause between two products handled by the same worker
task_delay_ms = 1000
dequeue_timeout_ms = 1000
join_timeout_secs = 60
# Stop after this many review pages per product (unset = no limit)
# max_pages = 50

[selectors]
page_loaded = "main"
reviews_section = "#customer-review-widget-id"
container = "div.review-comment"
title = "div.review-comment__title"
content = "div.review-comment__content"
show_more = "span.show-more-content"
next_page = "a.btn.next"

[discovery]
home_url = "https://tiki.vn/"
popup_close = "img[alt='close-icon']"
category_block = "div.sc-cffe1c5-0.bKBPyH"
category_heading = "div"
category_heading_text = "Danh mục"
product_link = "a.product-item"
load_more = "div[data-view-id='category_infinity_view.more']"
# How many times to press "load more" on a category page
max_load_more = 0
load_more_settle_ms = 3000
category_settle_ms = 2000

[paths]
data_dir = "data"
logs_dir = "logs"
categories_file = "urls.csv"
products_file = "url_final.csv"
reviews_file = "raw_data.csv"
url_column = "URL"
label_column = "detail"
excel_bom = true

[logging]
level = "info"
file_name = "reviewtap.log"
# daily, hourly or never
rotation = "daily"
console = true
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
