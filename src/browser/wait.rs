//! Bounded waits over a [`Session`].
//!
//! Nothing here blocks past its timeout: a wait that runs out returns
//! `Ok(None)` and the caller decides what "not there" means. Transient DOM
//! errors while polling are retried; fatal session errors end the wait.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::browser::{DomResult, Session};

/// Timeout and polling cadence for one wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wait {
    pub timeout: Duration,
    pub poll: Duration,
}

impl Wait {
    pub fn new(timeout: Duration, poll: Duration) -> Self {
        Self { timeout, poll }
    }
}

/// What a matching element must satisfy before a wait succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Present,
    Visible,
    /// Visible and enabled
    Clickable,
}

impl Condition {
    async fn matches<S: Session>(self, session: &S, node: &S::Node) -> DomResult<bool> {
        match self {
            Condition::Present => Ok(true),
            Condition::Visible => session.is_visible(node).await,
            Condition::Clickable => {
                Ok(session.is_visible(node).await? && session.is_enabled(node).await?)
            }
        }
    }
}

/// Run `probe` until it yields a value or `wait.timeout` elapses.
pub async fn poll_until<T, F, Fut>(wait: Wait, mut probe: F) -> DomResult<Option<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = DomResult<Option<T>>>,
{
    let deadline = Instant::now() + wait.timeout;

    loop {
        match probe().await {
            Ok(Some(value)) => return Ok(Some(value)),
            Ok(None) => {}
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => debug!("Retrying after transient error: {}", e),
        }

        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        tokio::time::sleep(wait.poll.min(deadline - now)).await;
    }
}

/// Wait for the first element matching `selector` that satisfies `condition`.
pub async fn wait_for<S: Session>(
    session: &S,
    selector: &str,
    condition: Condition,
    wait: Wait,
) -> DomResult<Option<S::Node>> {
    poll_until(wait, move || async move {
        for node in session.find_all(selector).await? {
            if condition.matches(session, &node).await? {
                return Ok(Some(node));
            }
        }
        Ok(None)
    })
    .await
}
