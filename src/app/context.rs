use std::path::{Path, PathBuf};

use crate::app::error::Result;
use crate::config::Config;

/// Effective configuration plus the directory layout derived from it.
pub struct AppContext {
    pub config: Config,
    pub config_path: Option<PathBuf>,
}

impl AppContext {
    /// Load configuration from `config_path`, or from the default location.
    pub fn new(config_path: Option<PathBuf>) -> Result<Self> {
        let config = match config_path {
            Some(ref path) => Config::load_from(path)?,
            None => Config::load()?,
        };

        Ok(Self {
            config,
            config_path,
        })
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            config_path: None,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.config.paths.data_dir
    }

    pub fn logs_dir(&self) -> &Path {
        &self.config.paths.logs_dir
    }

    /// Resolve a file name against the data directory. Absolute paths are kept.
    pub fn data_file(&self, name: impl AsRef<Path>) -> PathBuf {
        self.data_dir().join(name)
    }

    pub fn categories_path(&self) -> PathBuf {
        self.data_file(&self.config.paths.categories_file)
    }

    pub fn products_path(&self) -> PathBuf {
        self.data_file(&self.config.paths.products_file)
    }

    pub fn reviews_path(&self) -> PathBuf {
        self.data_file(&self.config.paths.reviews_file)
    }

    /// Create the data and log directories if they do not exist yet.
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(self.data_dir())?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}
