use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::browser::{Session, SessionFactory};
use crate::collector::queue::{Dequeue, WorkQueue};
use crate::collector::sink::ResultSink;
use crate::collector::CollectorConfig;
use crate::scraper::Paginator;

/// What one worker did before it exited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub id: usize,
    pub tasks: usize,
    pub records: usize,
    pub failed_tasks: usize,
    /// Sessions recreated after a failed task
    pub restarts: usize,
    /// Exited without a usable session instead of draining the queue
    pub died: bool,
}

/// Fixed-size set of workers, each owning one session for its lifetime.
pub struct WorkerPool<F> {
    factory: Arc<F>,
    paginator: Arc<Paginator>,
    config: CollectorConfig,
}

/// Handles to spawned workers.
pub struct RunningPool {
    pub handles: Vec<JoinHandle<WorkerReport>>,
    live: watch::Receiver<usize>,
}

impl RunningPool {
    /// Resolves once no worker is running any more.
    pub async fn all_exited(&self) {
        let mut live = self.live.clone();
        // Every worker holds a sender clone until it exits
        let _ = live.wait_for(|n| *n == 0).await;
    }
}

/// Decrements the live-worker count when the worker ends, panics included.
struct LiveGuard(Arc<watch::Sender<usize>>);

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.send_modify(|n| *n = n.saturating_sub(1));
    }
}

impl<F> WorkerPool<F>
where
    F: SessionFactory + 'static,
{
    pub fn new(factory: Arc<F>, paginator: Arc<Paginator>, config: CollectorConfig) -> Self {
        Self {
            factory,
            paginator,
            config,
        }
    }

    /// Start `workers` workers draining `queue` into `sink`.
    pub fn spawn(&self, workers: usize, queue: Arc<WorkQueue>, sink: Arc<ResultSink>) -> RunningPool {
        let (live_tx, live) = watch::channel(workers);
        let live_tx = Arc::new(live_tx);

        let handles = (1..=workers)
            .map(|id| {
                let worker = Worker {
                    id,
                    factory: self.factory.clone(),
                    paginator: self.paginator.clone(),
                    config: self.config.clone(),
                    queue: queue.clone(),
                    sink: sink.clone(),
                };
                let guard = LiveGuard(live_tx.clone());
                tokio::spawn(
                    async move {
                        let _guard = guard;
                        worker.run().await
                    }
                    .instrument(info_span!("worker", id)),
                )
            })
            .collect();

        RunningPool { handles, live }
    }
}

struct Worker<F> {
    id: usize,
    factory: Arc<F>,
    paginator: Arc<Paginator>,
    config: CollectorConfig,
    queue: Arc<WorkQueue>,
    sink: Arc<ResultSink>,
}

impl<F: SessionFactory> Worker<F> {
    async fn run(self) -> WorkerReport {
        let mut report = WorkerReport {
            id: self.id,
            ..Default::default()
        };

        let mut session = match self.factory.create().await {
            Ok(session) => session,
            Err(e) => {
                error!("Could not start browser session: {}", e);
                report.died = true;
                return report;
            }
        };
        info!("Worker started");

        loop {
            let lease = match self.queue.dequeue(self.config.dequeue_timeout()).await {
                Dequeue::Task(lease) => lease,
                Dequeue::Empty => continue,
                Dequeue::Exhausted => break,
            };

            let task = lease.task().clone();
            info!("Scraping {} [{}]", task.url, task.label);
            let result = self.paginator.run(&mut session, &task).await;

            report.tasks += 1;
            report.records += result.records.len();
            self.sink.append(result.records);
            lease.complete();

            if result.outcome.is_failed() {
                report.failed_tasks += 1;
                close_quietly(&mut session).await;
                match self.factory.create().await {
                    Ok(fresh) => {
                        session = fresh;
                        report.restarts += 1;
                        info!("Browser session recreated");
                    }
                    Err(e) => {
                        error!("CRITICAL: could not recreate browser session, worker stopping: {}", e);
                        report.died = true;
                        return report;
                    }
                }
            }

            tokio::time::sleep(self.config.task_delay()).await;
        }

        close_quietly(&mut session).await;
        info!(
            "Worker finished: {} tasks, {} records, {} restarts",
            report.tasks, report.records, report.restarts
        );
        report
    }
}

async fn close_quietly<S: Session>(session: &mut S) {
    if let Err(e) = session.close().await {
        debug!("Closing browser session failed: {}", e);
    }
}

/// Join every worker, waiting at most `timeout` for all of them together.
/// A worker still running past the bound is left detached.
pub async fn join_workers(pool: RunningPool, timeout: std::time::Duration) -> Vec<WorkerReport> {
    let deadline = tokio::time::Instant::now() + timeout;
    let mut reports = Vec::with_capacity(pool.handles.len());
    for (index, handle) in pool.handles.into_iter().enumerate() {
        match tokio::time::timeout_at(deadline, handle).await {
            Ok(Ok(report)) => reports.push(report),
            Ok(Err(e)) => error!("Worker {} panicked: {}", index + 1, e),
            Err(_) => warn!("Worker {} still running after {:?}", index + 1, timeout),
        }
    }
    reports
}
