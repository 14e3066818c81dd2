//! Browser automation layer.
//!
//! Everything above this module talks to a page through the [`Session`]
//! trait, so the review pipeline never sees a driver type. The production
//! implementation is [`ChromeSession`], backed by headless Chrome via
//! chromiumoxide.
//!
//! ```text
//! SessionFactory::create → Session → navigate / find / click / text
//! ```
//!
//! Bounded waits live in [`wait`]; they are generic over any session.

mod chrome;
mod config;
#[cfg(test)]
pub(crate) mod testing;
pub mod wait;

pub use chrome::{ChromeSession, ChromeSessionFactory};
pub use config::SessionConfig;

use async_trait::async_trait;

/// Failure of a single DOM interaction.
///
/// Only [`DomError::Session`] is fatal for the session; everything else is a
/// transient condition the caller skips past.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("element is no longer attached to the document")]
    Stale,

    #[error("element not found")]
    NotFound,

    #[error("click intercepted: {0}")]
    ClickIntercepted(String),

    #[error("timed out")]
    Timeout,

    #[error("script error: {0}")]
    Script(String),

    #[error("browser session failed: {0}")]
    Session(String),
}

impl DomError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, DomError::Session(_))
    }
}

pub type DomResult<T> = std::result::Result<T, DomError>;

/// One browser automation handle, exclusively owned by a single worker.
#[async_trait]
pub trait Session: Send + Sync {
    /// Handle to an element of the currently loaded document
    type Node: Send + Sync;

    async fn navigate(&mut self, url: &str) -> DomResult<()>;

    /// All elements matching `selector`; an empty list when nothing matches.
    async fn find_all(&self, selector: &str) -> DomResult<Vec<Self::Node>>;

    /// All descendants of `node` matching `selector`.
    async fn find_all_in(&self, node: &Self::Node, selector: &str) -> DomResult<Vec<Self::Node>>;

    /// First descendant of `node` matching `selector`, if any.
    async fn find_in(&self, node: &Self::Node, selector: &str) -> DomResult<Option<Self::Node>> {
        Ok(self.find_all_in(node, selector).await?.into_iter().next())
    }

    /// Rendered text of `node`, trimmed.
    async fn text(&self, node: &Self::Node) -> DomResult<String>;

    async fn attribute(&self, node: &Self::Node, name: &str) -> DomResult<Option<String>>;

    async fn is_visible(&self, node: &Self::Node) -> DomResult<bool>;

    /// Whether the control accepts interaction (not disabled by property, class or ARIA state).
    async fn is_enabled(&self, node: &Self::Node) -> DomResult<bool>;

    async fn scroll_into_view(&self, node: &Self::Node) -> DomResult<()>;

    async fn click(&self, node: &Self::Node) -> DomResult<()>;

    async fn scroll_to_bottom(&self) -> DomResult<()>;

    /// Release the underlying browser. Safe to call more than once.
    async fn close(&mut self) -> DomResult<()>;
}

/// Creates fresh, isolated sessions.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    type Session: Session + 'static;

    async fn create(&self) -> DomResult<Self::Session>;
}
