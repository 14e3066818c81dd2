use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::error::CdpError;
use chromiumoxide::{Element, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::browser::config::SessionConfig;
use crate::browser::{DomError, DomResult, Session, SessionFactory};

const IS_VISIBLE_JS: &str = "function() { \
    const style = window.getComputedStyle(this); \
    if (style.visibility === 'hidden' || style.display === 'none') { return false; } \
    return !!(this.offsetWidth || this.offsetHeight || this.getClientRects().length); \
}";

// Structured disabled signals only: the `disabled` property, a `disabled`
// class token and the ARIA state.
const IS_ENABLED_JS: &str = "function() { \
    if (this.disabled === true) { return false; } \
    if (this.classList && this.classList.contains('disabled')) { return false; } \
    return this.getAttribute('aria-disabled') !== 'true'; \
}";

const SCROLL_INTO_VIEW_JS: &str =
    "function() { this.scrollIntoView({block: 'center', inline: 'nearest'}); return true; }";

const CLICK_JS: &str = "function() { this.click(); return true; }";

const SCROLL_TO_BOTTOM_JS: &str = "window.scrollTo(0, document.body.scrollHeight)";

const STALE_MARKERS: &[&str] = &[
    "could not find node with given id",
    "no node with given id",
    "node is detached",
    "cannot find context with specified id",
    "cannot find object with id",
    "does not belong to the document",
];

const SESSION_MARKERS: &[&str] = &[
    "target closed",
    "session closed",
    "browser has disconnected",
    "connection closed",
    "websocket",
    "target crashed",
];

/// Map a raw driver error onto the DOM error taxonomy.
fn classify(err: CdpError) -> DomError {
    match err {
        CdpError::NotFound => DomError::NotFound,
        CdpError::Timeout => DomError::Timeout,
        CdpError::ScrollingFailed(msg) => DomError::ClickIntercepted(msg),
        CdpError::NoResponse | CdpError::Ws(_) | CdpError::ChannelSendError(_) => {
            DomError::Session(err.to_string())
        }
        other => classify_message(other.to_string()),
    }
}

/// Classify a protocol error message by its wording.
fn classify_message(message: String) -> DomError {
    let lower = message.to_lowercase();
    if STALE_MARKERS.iter().any(|m| lower.contains(m)) {
        DomError::Stale
    } else if SESSION_MARKERS.iter().any(|m| lower.contains(m)) {
        DomError::Session(message)
    } else {
        DomError::Script(message)
    }
}

/// One headless Chrome process with a single page, driven over CDP.
pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    config: SessionConfig,
    closed: bool,
}

impl ChromeSession {
    /// Launch a browser configured from `config` and open a blank page.
    pub async fn launch(config: &SessionConfig) -> DomResult<Self> {
        let mut builder = BrowserConfig::builder().window_size(config.window_width, config.window_height);
        for arg in config.launch_args() {
            builder = builder.arg(arg);
        }

        if !config.headless {
            builder = builder.with_head();
        }

        let browser_config = builder
            .build()
            .map_err(|e| DomError::Session(format!("Failed to build browser config: {}", e)))?;

        let (mut browser, mut handler) =
            match tokio::time::timeout(config.launch_timeout(), Browser::launch(browser_config)).await {
                Ok(Ok(launched)) => launched,
                Ok(Err(e)) => {
                    return Err(DomError::Session(format!(
                        "Failed to launch browser: {}. Is Chrome or Chromium installed and in PATH?",
                        e
                    )))
                }
                Err(_) => {
                    return Err(DomError::Session(format!(
                        "Browser did not start within {}s",
                        config.launch_timeout_secs
                    )))
                }
            };

        // Drain browser events until the connection goes away
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.close().await;
                handler.abort();
                return Err(DomError::Session(format!("Failed to create page: {}", e)));
            }
        };

        if let Err(e) = page.set_user_agent(&config.user_agent).await {
            warn!("Failed to set user agent: {}", e);
        }

        Ok(Self {
            browser,
            page,
            handler,
            config: config.clone(),
            closed: false,
        })
    }

    async fn call_bool(&self, node: &Element, function: &str) -> DomResult<bool> {
        let returns = node.call_js_fn(function, false).await.map_err(classify)?;
        if let Some(details) = returns.exception_details {
            return Err(classify_message(details.text));
        }
        Ok(returns
            .result
            .value
            .as_ref()
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false))
    }
}

#[async_trait]
impl Session for ChromeSession {
    type Node = Element;

    async fn navigate(&mut self, url: &str) -> DomResult<()> {
        match tokio::time::timeout(self.config.navigation_timeout(), self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(classify(e)),
            Err(_) => Err(DomError::Timeout),
        }
    }

    async fn find_all(&self, selector: &str) -> DomResult<Vec<Element>> {
        match self.page.find_elements(selector).await {
            Ok(nodes) => Ok(nodes),
            Err(CdpError::NotFound) => Ok(Vec::new()),
            Err(e) => Err(classify(e)),
        }
    }

    async fn find_all_in(&self, node: &Element, selector: &str) -> DomResult<Vec<Element>> {
        match node.find_elements(selector).await {
            Ok(nodes) => Ok(nodes),
            Err(CdpError::NotFound) => Ok(Vec::new()),
            Err(e) => Err(classify(e)),
        }
    }

    async fn text(&self, node: &Element) -> DomResult<String> {
        let text = node.inner_text().await.map_err(classify)?;
        Ok(text.map(|t| t.trim().to_string()).unwrap_or_default())
    }

    async fn attribute(&self, node: &Element, name: &str) -> DomResult<Option<String>> {
        node.attribute(name).await.map_err(classify)
    }

    async fn is_visible(&self, node: &Element) -> DomResult<bool> {
        self.call_bool(node, IS_VISIBLE_JS).await
    }

    async fn is_enabled(&self, node: &Element) -> DomResult<bool> {
        self.call_bool(node, IS_ENABLED_JS).await
    }

    async fn scroll_into_view(&self, node: &Element) -> DomResult<()> {
        self.call_bool(node, SCROLL_INTO_VIEW_JS).await.map(|_| ())
    }

    async fn click(&self, node: &Element) -> DomResult<()> {
        self.call_bool(node, CLICK_JS).await.map(|_| ())
    }

    async fn scroll_to_bottom(&self) -> DomResult<()> {
        self.page
            .evaluate(SCROLL_TO_BOTTOM_JS)
            .await
            .map(|_| ())
            .map_err(classify)
    }

    async fn close(&mut self) -> DomResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let result = self.browser.close().await.map(|_| ()).map_err(classify);
        if let Err(e) = self.browser.wait().await {
            debug!("Browser process wait failed: {}", e);
        }
        self.handler.abort();
        result
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

/// Launches a new [`ChromeSession`] per call.
pub struct ChromeSessionFactory {
    config: SessionConfig,
}

impl ChromeSessionFactory {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SessionFactory for ChromeSessionFactory {
    type Session = ChromeSession;

    async fn create(&self) -> DomResult<ChromeSession> {
        ChromeSession::launch(&self.config).await
    }
}
