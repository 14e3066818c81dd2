//! Multi-worker review collection.
//!
//! ```text
//! input rows → BatchDriver → WorkQueue → WorkerPool ─┬→ Paginator (per task)
//!                                                    └→ ResultSink → dedup → output
//! ```
//!
//! The queue and sink are the only state shared between workers; each
//! worker owns its browser session.

mod config;
mod driver;
mod pool;
mod queue;
mod sink;

pub use config::CollectorConfig;
pub use driver::{validate_rows, BatchDriver, BatchReport};
pub use pool::{join_workers, RunningPool, WorkerPool, WorkerReport};
pub use queue::{Dequeue, Lease, WorkQueue};
pub use sink::ResultSink;
