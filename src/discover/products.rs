use tracing::{debug, info, warn};
use url::Url;

use crate::browser::wait::{wait_for, Condition, Wait};
use crate::browser::{DomResult, Session};
use crate::discover::{push_unique, resolve_href, DiscoveryConfig};
use crate::domain::Task;

/// List the products of one category, labelled with the category URL.
pub async fn enumerate_products<S: Session>(
    session: &mut S,
    category_url: &str,
    config: &DiscoveryConfig,
    wait: Wait,
) -> DomResult<Vec<Task>> {
    session.navigate(category_url).await?;
    tokio::time::sleep(config.category_settle()).await;

    let pressed = press_load_more(session, config, wait).await?;
    if pressed > 0 {
        debug!("Pressed load more {} times on {}", pressed, category_url);
    }

    let base = Url::parse(category_url).ok();
    let mut urls = Vec::new();
    for anchor in session.find_all(&config.product_link).await? {
        match session.attribute(&anchor, "href").await {
            Ok(Some(href)) => {
                if let Some(url) = resolve_href(base.as_ref(), &href) {
                    push_unique(&mut urls, url);
                }
            }
            Ok(None) => {}
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => debug!("Skipping product link: {}", e),
        }
    }

    info!("{}: {} products", category_url, urls.len());
    Ok(urls
        .into_iter()
        .map(|url| Task::new(url, category_url))
        .collect())
}

async fn press_load_more<S: Session>(session: &S, config: &DiscoveryConfig, wait: Wait) -> DomResult<usize> {
    let mut pressed = 0;
    while pressed < config.max_load_more {
        session.scroll_to_bottom().await?;

        let Some(button) = wait_for(session, &config.load_more, Condition::Clickable, wait).await? else {
            debug!("Load more no longer available");
            break;
        };
        match session.click(&button).await {
            Ok(()) => pressed += 1,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!("Load more click failed: {}", e);
                break;
            }
        }
        tokio::time::sleep(config.load_more_settle()).await;
    }
    Ok(pressed)
}
