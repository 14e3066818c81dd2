use tracing::{debug, info, warn};
use url::Url;

use crate::browser::wait::{wait_for, Condition, Wait};
use crate::browser::{DomResult, Session};
use crate::discover::{push_unique, resolve_href, DiscoveryConfig};

/// Collect category URLs from the home page.
///
/// Returns hrefs in page order without duplicates. Only blocks whose
/// heading matches `category_heading_text` are read.
pub async fn discover_categories<S: Session>(
    session: &mut S,
    config: &DiscoveryConfig,
    wait: Wait,
) -> DomResult<Vec<String>> {
    session.navigate(&config.home_url).await?;
    let base = Url::parse(&config.home_url).ok();

    dismiss_popup(session, config, wait).await?;

    if wait_for(session, &config.category_block, Condition::Present, wait)
        .await?
        .is_none()
    {
        warn!("No category blocks on {}", config.home_url);
        return Ok(Vec::new());
    }

    let mut urls = Vec::new();
    for block in session.find_all(&config.category_block).await? {
        if !has_heading(session, &block, config).await? {
            continue;
        }
        for anchor in session.find_all_in(&block, "a").await? {
            match session.attribute(&anchor, "href").await {
                Ok(Some(href)) => {
                    if let Some(url) = resolve_href(base.as_ref(), &href) {
                        push_unique(&mut urls, url);
                    }
                }
                Ok(None) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => debug!("Skipping category link: {}", e),
            }
        }
    }

    info!("Found {} categories on {}", urls.len(), config.home_url);
    Ok(urls)
}

async fn dismiss_popup<S: Session>(session: &S, config: &DiscoveryConfig, wait: Wait) -> DomResult<()> {
    let Some(close) = wait_for(session, &config.popup_close, Condition::Clickable, wait).await? else {
        debug!("No pop-up to close");
        return Ok(());
    };
    match session.click(&close).await {
        Ok(()) => {
            info!("Closed pop-up");
            Ok(())
        }
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            warn!("Could not close pop-up: {}", e);
            Ok(())
        }
    }
}

async fn has_heading<S: Session>(session: &S, block: &S::Node, config: &DiscoveryConfig) -> DomResult<bool> {
    let headings = match session.find_all_in(block, &config.category_heading).await {
        Ok(headings) => headings,
        Err(e) if e.is_fatal() => return Err(e),
        Err(_) => return Ok(false),
    };
    for heading in &headings {
        match session.text(heading).await {
            Ok(text) if text.trim() == config.category_heading_text => return Ok(true),
            Ok(_) => {}
            Err(e) if e.is_fatal() => return Err(e),
            Err(_) => {}
        }
    }
    Ok(false)
}
