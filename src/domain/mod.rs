pub mod review;
pub mod task;

pub use review::{dedup_records, RawReview, ReviewRecord, NOT_AVAILABLE};
pub use task::Task;
