//! Execution log document store.
//!
//! Execution records are kept as binary documents next to the two fields
//! queries filter and sort on (`job_name`, `start_time`). Decoding happens on
//! the reading side, so a single corrupt document never fails a whole query.

pub mod memory;
#[cfg(feature = "sqlite-backend")]
pub mod sqlite;

pub use memory::InMemoryLogStore;

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::model::JobLog;

/// Equality filter on the job name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFilter {
    pub job_name: String,
}

/// Ordering on `start_time`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

/// A `Find` request against the log store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFind {
    pub filter: LogFilter,
    pub sort: SortOrder,
    /// Matching documents dropped from the head of the ordered result.
    pub skip: u64,
    /// Maximum number of documents returned after skipping.
    pub limit: u64,
}

impl LogFind {
    /// Newest-first page of the records of one job.
    #[must_use]
    pub fn newest_first(job_name: impl Into<String>, skip: u64, limit: u64) -> Self {
        Self {
            filter: LogFilter {
                job_name: job_name.into(),
            },
            sort: SortOrder::Descending,
            skip,
            limit,
        }
    }
}

/// A stored execution record in its binary form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogDocument {
    pub data: Vec<u8>,
}

impl LogDocument {
    /// Decode the document into a [`JobLog`].
    pub fn decode(&self) -> StoreResult<JobLog> {
        JobLog::from_document(&self.data)
    }
}

/// Client of the execution log document store.
#[async_trait]
pub trait LogStore: Send + Sync + std::fmt::Debug {
    /// Append a batch of records.
    ///
    /// Returns the number of records written.
    async fn insert_many(&self, records: &[JobLog]) -> StoreResult<usize>;

    /// Run a find and return every document it yields.
    ///
    /// The store-side cursor is drained and released before this returns,
    /// on success and on failure alike.
    async fn find(&self, query: &LogFind) -> StoreResult<Vec<LogDocument>>;

    /// Check that the store is reachable.
    async fn ping(&self) -> StoreResult<()>;
}
