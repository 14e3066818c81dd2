//! Finding what to scrape: category pages from the home page, then product
//! pages from each category. The product list feeds the review collector.

mod categories;
mod config;
mod products;

pub use categories::discover_categories;
pub use config::DiscoveryConfig;
pub use products::enumerate_products;

use tracing::{error, info, warn};
use url::Url;

use crate::app::Result;
use crate::browser::wait::Wait;
use crate::browser::{Session, SessionFactory};
use crate::domain::Task;

/// Make `href` absolute against `base`; `None` for empty or unparsable links.
pub(crate) fn resolve_href(base: Option<&Url>, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }
    let url = match base {
        Some(base) => base.join(href),
        None => Url::parse(href),
    };
    url.ok().map(String::from)
}

pub(crate) fn push_unique(urls: &mut Vec<String>, url: String) {
    if !urls.contains(&url) {
        urls.push(url);
    }
}

/// Open one session, read the home page's categories, close the session.
pub async fn collect_categories<F: SessionFactory>(
    factory: &F,
    config: &DiscoveryConfig,
    wait: Wait,
) -> Result<Vec<String>> {
    let mut session = factory.create().await?;
    let result = discover_categories(&mut session, config, wait).await;
    if let Err(e) = session.close().await {
        warn!("Closing browser session failed: {}", e);
    }
    Ok(result?)
}

/// Enumerate products for every category with one session.
///
/// A category that fails is logged and skipped. When the session itself
/// breaks it is replaced; if no replacement can be started the error is
/// returned.
pub async fn collect_products<F: SessionFactory>(
    factory: &F,
    categories: &[String],
    config: &DiscoveryConfig,
    wait: Wait,
) -> Result<Vec<Task>> {
    let mut session = factory.create().await?;
    let mut tasks = Vec::new();

    for (index, category) in categories.iter().enumerate() {
        info!("Category {}/{}: {}", index + 1, categories.len(), category);
        match enumerate_products(&mut session, category, config, wait).await {
            Ok(found) => tasks.extend(found),
            Err(e) if e.is_fatal() => {
                error!("Browser session failed on {}: {}", category, e);
                if let Err(e) = session.close().await {
                    warn!("Closing broken browser session failed: {}", e);
                }
                session = factory.create().await?;
            }
            Err(e) => warn!("Skipping category {}: {}", category, e),
        }
    }

    if let Err(e) = session.close().await {
        warn!("Closing browser session failed: {}", e);
    }
    info!("Found {} products in {} categories", tasks.len(), categories.len());
    Ok(tasks)
}
