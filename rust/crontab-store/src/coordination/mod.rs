//! Job and worker coordination clients.
//!
//! The coordination store owns the job registry, the kill signals consumed by
//! the executors and the registrations of live workers. The scheduling loop
//! that watches these keys runs elsewhere; this module only reads and writes
//! them.
//!
//! Key layout (shared with the workers):
//!
//! | Prefix            | Value                         |
//! |-------------------|-------------------------------|
//! | `/cron/jobs/`     | JSON encoded [`Job`]          |
//! | `/cron/killer/`   | empty, short-lived signal     |
//! | `/cron/workers/`  | empty, kept alive by a worker |

pub mod memory;
#[cfg(feature = "redis-backend")]
pub mod redis;

pub use memory::InMemoryCoordinator;

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::model::Job;

/// Prefix of saved job definitions.
pub const JOB_SAVE_DIR: &str = "/cron/jobs/";

/// Prefix of kill signals.
pub const JOB_KILLER_DIR: &str = "/cron/killer/";

/// Prefix of live worker registrations.
pub const JOB_WORKER_DIR: &str = "/cron/workers/";

/// Client of the job/worker coordination service.
///
/// Implementations are shared by every request handler, so all methods take
/// `&self` and concurrency control is left to the backing store.
#[async_trait]
pub trait JobCoordinator: Send + Sync + std::fmt::Debug {
    /// Store a job, replacing any job with the same name.
    ///
    /// Returns the replaced job, or `None` if the name was new.
    async fn save_job(&self, job: &Job) -> StoreResult<Option<Job>>;

    /// Delete a job by name.
    ///
    /// Returns the deleted job, or `None` if nothing was stored under `name`.
    async fn delete_job(&self, name: &str) -> StoreResult<Option<Job>>;

    /// List every stored job.
    async fn list_jobs(&self) -> StoreResult<Vec<Job>>;

    /// Signal workers to terminate any running instance of the job.
    ///
    /// Returns once the signal is written, not when the run has stopped.
    async fn kill_job(&self, name: &str) -> StoreResult<()>;

    /// List identities of the currently registered workers.
    async fn list_workers(&self) -> StoreResult<Vec<String>>;
}

/// Coordination key of a saved job.
pub(crate) fn job_key(name: &str) -> String {
    format!("{JOB_SAVE_DIR}{name}")
}

/// Coordination key of a kill signal.
pub(crate) fn killer_key(name: &str) -> String {
    format!("{JOB_KILLER_DIR}{name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_use_directory_prefixes() {
        assert_eq!(job_key("job1"), "/cron/jobs/job1");
        assert_eq!(killer_key("job1"), "/cron/killer/job1");
        assert_eq!(job_key(""), JOB_SAVE_DIR);
    }
}
