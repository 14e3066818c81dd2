use std::time::Duration;

use tracing::{debug, warn};

use crate::browser::{DomError, DomResult, Session};
use crate::collector::CollectorConfig;
use crate::domain::RawReview;
use crate::scraper::ReviewSelectors;

/// Reads the reviews rendered on the current page.
///
/// Both steps only touch the DOM already loaded in the session. Transient
/// errors are logged and skipped; the returned `Err` is always fatal.
pub struct PageExtractor<'a> {
    selectors: &'a ReviewSelectors,
    expand_settle: Duration,
    after_expand: Duration,
}

impl<'a> PageExtractor<'a> {
    pub fn new(selectors: &'a ReviewSelectors, config: &CollectorConfig) -> Self {
        Self {
            selectors,
            expand_settle: config.expand_settle(),
            after_expand: config.after_expand(),
        }
    }

    /// Expand truncated reviews, then read every review on the page.
    pub async fn expand_and_extract<S: Session>(&self, session: &S) -> DomResult<Vec<RawReview>> {
        self.expand(session).await?;
        self.extract(session).await
    }

    /// Click every visible "show more" control inside review content.
    ///
    /// Returns how many controls were clicked. A control that went stale or
    /// whose click was intercepted is skipped without retry.
    pub async fn expand<S: Session>(&self, session: &S) -> DomResult<usize> {
        let controls = match session.find_all(&self.selectors.show_more_in_content()).await {
            Ok(controls) => controls,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!("Could not look up show-more controls: {}", e);
                return Ok(0);
            }
        };

        let mut clicked = 0;
        for control in &controls {
            match self.expand_one(session, control).await {
                Ok(true) => clicked += 1,
                Ok(false) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(DomError::Stale) => debug!("Show-more control went stale"),
                Err(DomError::ClickIntercepted(reason)) => {
                    warn!("Show-more click intercepted: {}", reason)
                }
                Err(e) => warn!("Show-more click failed: {}", e),
            }
        }

        if clicked > 0 {
            debug!("Expanded {} truncated reviews", clicked);
        }
        Ok(clicked)
    }

    async fn expand_one<S: Session>(&self, session: &S, control: &S::Node) -> DomResult<bool> {
        if !session.is_visible(control).await? {
            return Ok(false);
        }
        session.scroll_into_view(control).await?;
        tokio::time::sleep(self.expand_settle).await;
        session.click(control).await?;
        tokio::time::sleep(self.after_expand).await;
        Ok(true)
    }

    /// Read title and content of every review container on the page.
    pub async fn extract<S: Session>(&self, session: &S) -> DomResult<Vec<RawReview>> {
        let containers = match session.find_all(&self.selectors.container).await {
            Ok(containers) => containers,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!("Could not look up review containers: {}", e);
                return Ok(Vec::new());
            }
        };

        let mut reviews = Vec::with_capacity(containers.len());
        for container in &containers {
            match self.read_container(session, container).await {
                Ok(review) => reviews.push(review),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => debug!("Skipping review container: {}", e),
            }
        }

        Ok(reviews)
    }

    async fn read_container<S: Session>(&self, session: &S, container: &S::Node) -> DomResult<RawReview> {
        let title = self.field_text(session, container, &self.selectors.title).await?;
        let content = self.field_text(session, container, &self.selectors.content).await?;
        Ok(RawReview::from_parts(title, content))
    }

    /// Text of the first `selector` match inside `container`; `None` when absent.
    async fn field_text<S: Session>(
        &self,
        session: &S,
        container: &S::Node,
        selector: &str,
    ) -> DomResult<Option<String>> {
        match session.find_in(container, selector).await {
            Ok(Some(node)) => session.text(&node).await.map(Some),
            Ok(None) | Err(DomError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
