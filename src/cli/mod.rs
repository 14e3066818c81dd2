pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "reviewtap")]
#[command(about = "Collects product reviews from an online shop with headless Chrome", long_about = None)]
pub struct Cli {
    /// Configuration file (default: ~/.config/reviewtap/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Number of parallel browser workers
    #[arg(short, long, global = true)]
    pub workers: Option<usize>,

    /// Show the browser windows instead of running headless
    #[arg(long, global = true)]
    pub show_browser: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Apply command-line flags on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(workers) = self.workers {
            config.collector.workers = workers.max(1);
        }
        if self.show_browser {
            config.browser.headless = false;
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Find category pages on the home page
    Categories {
        /// Where to write the category URLs
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List the products of every category
    Products {
        /// Category URL list
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Where to write the product list
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Scrape the reviews of every product
    Reviews {
        /// Product list with URL and label columns
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Where to write the reviews
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Categories, products, then reviews, using the files in the data directory
    Run,
    /// Show the effective configuration
    Config,
}
