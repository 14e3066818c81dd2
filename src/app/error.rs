use std::path::PathBuf;

use thiserror::Error;

use crate::browser::DomError;
use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum ReviewtapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Browser error: {0}")]
    Browser(#[from] DomError),

    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Missing required column '{column}' in {}", .path.display())]
    MissingColumn { column: String, path: PathBuf },

    #[error("Failed to write {}: {source}", .path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ReviewtapError>;
