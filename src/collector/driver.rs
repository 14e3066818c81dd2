use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};
use url::Url;

use crate::app::Result;
use crate::browser::SessionFactory;
use crate::collector::pool::{join_workers, WorkerPool, WorkerReport};
use crate::collector::queue::WorkQueue;
use crate::collector::sink::ResultSink;
use crate::collector::CollectorConfig;
use crate::domain::{dedup_records, ReviewRecord, Task, NOT_AVAILABLE};
use crate::scraper::{Paginator, ReviewSelectors};
use crate::table::{self, InputRow, TableFormat};

/// Summary of one collection run.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Deduplicated records, in first-seen order
    pub records: Vec<ReviewRecord>,
    pub valid_tasks: usize,
    pub skipped_rows: usize,
    pub tasks_completed: usize,
    pub failed_tasks: usize,
    /// Records before deduplication
    pub raw_records: usize,
    /// Tasks nobody picked up because every worker had died
    pub abandoned: usize,
    pub workers: Vec<WorkerReport>,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn unique_records(&self) -> usize {
        self.records.len()
    }
}

/// Turn input rows into tasks, skipping rows without an http(s) URL.
///
/// Returns the tasks and the number of rows skipped.
pub fn validate_rows(rows: Vec<InputRow>) -> (Vec<Task>, usize) {
    let mut tasks = Vec::with_capacity(rows.len());
    let mut skipped = 0;

    for row in rows {
        match Url::parse(&row.url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => {
                warn!("Line {}: unsupported scheme '{}', skipping", row.line, url.scheme());
                skipped += 1;
                continue;
            }
            Err(e) => {
                warn!("Line {}: invalid URL '{}' ({}), skipping", row.line, row.url, e);
                skipped += 1;
                continue;
            }
        }

        match row.label {
            Some(label) if !label.trim().is_empty() => tasks.push(Task::new(row.url, label)),
            _ => {
                warn!("Line {}: no label for {}, using {}", row.line, row.url, NOT_AVAILABLE);
                tasks.push(Task::unlabelled(row.url));
            }
        }
    }

    (tasks, skipped)
}

/// Runs the worker pool over a task list.
pub struct BatchDriver<F> {
    factory: Arc<F>,
    selectors: ReviewSelectors,
    config: CollectorConfig,
}

impl<F> BatchDriver<F>
where
    F: SessionFactory + 'static,
{
    pub fn new(factory: F, selectors: ReviewSelectors, config: CollectorConfig) -> Self {
        Self {
            factory: Arc::new(factory),
            selectors,
            config,
        }
    }

    /// Scrape every valid row. Starts no worker when no row is valid.
    pub async fn run(&self, rows: Vec<InputRow>) -> BatchReport {
        let started = Instant::now();
        let (tasks, skipped_rows) = validate_rows(rows);
        let mut report = BatchReport {
            valid_tasks: tasks.len(),
            skipped_rows,
            ..Default::default()
        };

        if tasks.is_empty() {
            warn!("No valid tasks, nothing to scrape");
            report.elapsed = started.elapsed();
            return report;
        }

        let workers = self.config.workers.max(1).min(tasks.len());
        info!("Scraping {} products with {} workers", tasks.len(), workers);

        let queue = Arc::new(WorkQueue::new(tasks));
        let sink = Arc::new(ResultSink::new());
        let paginator = Arc::new(Paginator::new(self.selectors.clone(), self.config.clone()));
        let pool = WorkerPool::new(self.factory.clone(), paginator, self.config.clone());
        let running = pool.spawn(workers, queue.clone(), sink.clone());

        tokio::select! {
            _ = queue.wait_drained() => info!("All tasks completed"),
            _ = running.all_exited() => {
                report.abandoned = queue.abandon_remaining().await;
                if report.abandoned > 0 {
                    error!("Every worker stopped, {} tasks were not scraped", report.abandoned);
                }
            }
        }

        report.workers = join_workers(running, self.config.join_timeout()).await;
        report.tasks_completed = report.workers.iter().map(|w| w.tasks).sum();
        report.failed_tasks = report.workers.iter().map(|w| w.failed_tasks).sum();

        // Workers past the join bound may still append; take what is there
        let records = match Arc::try_unwrap(sink) {
            Ok(sink) => sink.into_records(),
            Err(shared) => shared.snapshot(),
        };
        report.raw_records = records.len();
        report.records = dedup_records(records);
        report.elapsed = started.elapsed();

        info!(
            "Collected {} reviews ({} unique) from {} tasks in {:.1}s",
            report.raw_records,
            report.records.len(),
            report.tasks_completed,
            report.elapsed.as_secs_f64()
        );
        report
    }

    /// Read the task list at `input`, scrape it and write reviews to `output`.
    ///
    /// A missing input file or URL column fails before any worker starts. The
    /// output file is written even when nothing was collected.
    pub async fn run_files(&self, input: &Path, output: &Path, format: &TableFormat) -> Result<BatchReport> {
        let rows = table::read_task_rows(input, format)?;
        info!("Loaded {} rows from {}", rows.len(), input.display());

        let report = self.run(rows).await;

        if let Err(e) = table::write_reviews(output, &report.records, format.bom) {
            error!("{} reviews collected but not saved: {}", report.records.len(), e);
            return Err(e);
        }
        info!("Wrote {} reviews to {}", report.records.len(), output.display());
        Ok(report)
    }
}
