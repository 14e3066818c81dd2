use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::ReviewRecord;

/// Append-only collection of records shared by all workers.
#[derive(Default)]
pub struct ResultSink {
    records: Mutex<Vec<ReviewRecord>>,
}

impl ResultSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task's records in one critical section.
    pub fn append(&self, records: Vec<ReviewRecord>) {
        if records.is_empty() {
            return;
        }
        self.lock().extend(records);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_records(self) -> Vec<ReviewRecord> {
        self.records.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of everything appended so far.
    pub fn snapshot(&self) -> Vec<ReviewRecord> {
        self.lock().clone()
    }

    // A panic elsewhere cannot leave a half-extended Vec behind
    fn lock(&self) -> MutexGuard<'_, Vec<ReviewRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
