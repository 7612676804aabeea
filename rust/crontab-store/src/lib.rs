//! Storage clients for the crontab control plane.
//!
//! This crate provides:
//! - The job and execution-log data model shared by the API and the workers
//! - [`JobCoordinator`]: job mutation, kill signalling and worker enumeration
//!   against the coordination store (Redis or in-process)
//! - [`LogStore`]: append and filtered retrieval of execution records held
//!   as binary documents (SQLite or in-process)
//!
//! # Usage
//!
//! ```rust,ignore
//! use crontab_store::{InMemoryCoordinator, Job, JobCoordinator};
//!
//! let coordinator = InMemoryCoordinator::new();
//! let previous = coordinator
//!     .save_job(&Job::new("job1", "echo hi", "* * * * *"))
//!     .await?;
//! assert!(previous.is_none());
//! ```

pub mod coordination;
pub mod error;
pub mod logstore;
pub mod model;

// Re-exports
pub use coordination::{InMemoryCoordinator, JobCoordinator};
pub use error::{StoreError, StoreResult};
pub use logstore::{InMemoryLogStore, LogDocument, LogFilter, LogFind, LogStore, SortOrder};
pub use model::{Job, JobLog};

#[cfg(feature = "redis-backend")]
pub use coordination::redis::RedisCoordinator;
#[cfg(feature = "sqlite-backend")]
pub use logstore::sqlite::SqliteLogStore;
