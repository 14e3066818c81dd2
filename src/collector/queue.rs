use std::time::Duration;

use tokio::sync::{mpsc, watch, Mutex};
use tracing::warn;

use crate::domain::Task;

/// Shared FIFO of tasks with a completion barrier.
///
/// The queue is filled once and closed, so "no task arrives" and "no task
/// will ever arrive" are distinct answers. The outstanding count only drops
/// when a [`Lease`] is completed or dropped, never on dequeue.
pub struct WorkQueue {
    rx: Mutex<mpsc::UnboundedReceiver<Task>>,
    outstanding: watch::Sender<usize>,
}

/// Result of one dequeue attempt.
pub enum Dequeue<'a> {
    Task(Lease<'a>),
    /// Nothing was handed out before the timeout
    Empty,
    /// Every task has been handed out
    Exhausted,
}

impl WorkQueue {
    pub fn new(tasks: Vec<Task>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let count = tasks.len();
        for task in tasks {
            // The receiver is alive right here
            let _ = tx.send(task);
        }
        let (outstanding, _) = watch::channel(count);

        Self {
            rx: Mutex::new(rx),
            outstanding,
        }
    }

    pub async fn dequeue(&self, timeout: Duration) -> Dequeue<'_> {
        let next = async { self.rx.lock().await.recv().await };
        match tokio::time::timeout(timeout, next).await {
            Ok(Some(task)) => Dequeue::Task(Lease {
                task,
                outstanding: &self.outstanding,
                completed: false,
            }),
            Ok(None) => Dequeue::Exhausted,
            Err(_) => Dequeue::Empty,
        }
    }

    /// Tasks not yet marked complete, including ones currently leased.
    pub fn outstanding(&self) -> usize {
        *self.outstanding.borrow()
    }

    /// Resolves once every task has been marked complete.
    pub async fn wait_drained(&self) {
        let mut rx = self.outstanding.subscribe();
        // The sender lives in `self`, so the channel cannot close under us
        let _ = rx.wait_for(|n| *n == 0).await;
    }

    /// Complete every task nobody dequeued. Used when no worker is left to
    /// take them; returns how many were dropped.
    pub async fn abandon_remaining(&self) -> usize {
        let mut rx = self.rx.lock().await;
        let mut abandoned = 0;
        while let Ok(task) = rx.try_recv() {
            warn!("Abandoning {} ({}): no worker left", task.url, task.label);
            mark_complete(&self.outstanding);
            abandoned += 1;
        }
        abandoned
    }
}

fn mark_complete(outstanding: &watch::Sender<usize>) {
    outstanding.send_modify(|n| *n = n.saturating_sub(1));
}

/// A dequeued task. Completes its task exactly once: through
/// [`Lease::complete`] or, failing that, when dropped.
pub struct Lease<'a> {
    task: Task,
    outstanding: &'a watch::Sender<usize>,
    completed: bool,
}

impl Lease<'_> {
    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn complete(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        if !self.completed {
            self.completed = true;
            mark_complete(self.outstanding);
        }
    }
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        self.finish();
    }
}
