use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::info;

use crate::app::{AppContext, Result, ReviewtapError};
use crate::browser::ChromeSessionFactory;
use crate::collector::{BatchDriver, BatchReport};
use crate::discover;
use crate::table::{self, TableFormat};

fn factory(ctx: &AppContext) -> ChromeSessionFactory {
    ChromeSessionFactory::new(ctx.config.browser.clone())
}

fn format(ctx: &AppContext) -> TableFormat {
    TableFormat::from(&ctx.config.paths)
}

fn or_default(path: Option<&Path>, default: PathBuf) -> PathBuf {
    path.map(Path::to_path_buf).unwrap_or(default)
}

/// Write the home page's category URLs.
pub async fn categories(ctx: &AppContext, output: Option<&Path>) -> Result<()> {
    let output = or_default(output, ctx.categories_path());
    let config = &ctx.config;

    let urls = discover::collect_categories(&factory(ctx), &config.discovery, config.collector.short_wait()).await?;
    table::write_urls(&output, &urls, &format(ctx))?;

    println!("Found {} categories, written to {}", urls.len(), output.display());
    Ok(())
}

/// Write the product list of every category in `input`.
pub async fn products(ctx: &AppContext, input: Option<&Path>, output: Option<&Path>) -> Result<()> {
    let input = or_default(input, ctx.categories_path());
    let output = or_default(output, ctx.products_path());
    let config = &ctx.config;
    let format = format(ctx);

    let categories = table::read_urls(&input, &format.url_column)?;
    if categories.is_empty() {
        println!("No categories in {}", input.display());
    }

    let tasks = discover::collect_products(
        &factory(ctx),
        &categories,
        &config.discovery,
        config.collector.short_wait(),
    )
    .await?;
    table::write_tasks(&output, &tasks, &format)?;

    println!(
        "Found {} products in {} categories, written to {}",
        tasks.len(),
        categories.len(),
        output.display()
    );
    Ok(())
}

/// Scrape reviews for every product in `input`.
pub async fn reviews(ctx: &AppContext, input: Option<&Path>, output: Option<&Path>) -> Result<()> {
    let input = or_default(input, ctx.products_path());
    let output = or_default(output, ctx.reviews_path());
    let config = &ctx.config;

    let driver = BatchDriver::new(factory(ctx), config.selectors.clone(), config.collector.clone());
    let report = driver.run_files(&input, &output, &format(ctx)).await?;

    print_summary(&report, &output);
    Ok(())
}

fn print_summary(report: &BatchReport, output: &Path) {
    println!(
        "Scraped {} of {} products ({} failed, {} rows skipped)",
        report.tasks_completed, report.valid_tasks, report.failed_tasks, report.skipped_rows
    );
    if report.abandoned > 0 {
        println!("  {} products were not scraped: every worker stopped", report.abandoned);
    }
    println!(
        "{} reviews ({} unique) written to {} in {:.1}s",
        report.raw_records,
        report.unique_records(),
        output.display(),
        report.elapsed.as_secs_f64()
    );
}

/// Categories, products and reviews in one go, through the data directory.
pub async fn run_pipeline(ctx: &AppContext) -> Result<()> {
    let started = Instant::now();
    info!("Pipeline started, data in {}", ctx.data_dir().display());

    categories(ctx, None).await?;
    products(ctx, None, None).await?;
    reviews(ctx, None, None).await?;

    info!("Pipeline finished in {:.1}s", started.elapsed().as_secs_f64());
    Ok(())
}

/// Print where the configuration came from and what it contains.
pub fn show_config(ctx: &AppContext) -> Result<()> {
    match &ctx.config_path {
        Some(path) => println!("# {}", path.display()),
        None => {
            if let Ok(path) = crate::config::Config::default_config_path() {
                println!("# {}", path.display());
            }
        }
    }

    let rendered = toml::to_string_pretty(&ctx.config)
        .map_err(|e| ReviewtapError::Other(format!("Failed to render configuration: {}", e)))?;
    println!("{}", rendered);
    Ok(())
}
