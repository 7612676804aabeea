//! In-process coordination store for local runs and testing.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use super::JobCoordinator;
use crate::error::StoreResult;
use crate::model::Job;

/// In-memory job registry.
///
/// Jobs are listed in name order, matching a prefix read of the coordination
/// store. Kill signals accumulate until drained with
/// [`InMemoryCoordinator::take_kill_signals`].
#[derive(Debug, Default)]
pub struct InMemoryCoordinator {
    jobs: RwLock<BTreeMap<String, Job>>,
    workers: RwLock<BTreeSet<String>>,
    kill_signals: Mutex<Vec<String>>,
}

impl InMemoryCoordinator {
    /// Create an empty coordinator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a live worker.
    pub fn register_worker(&self, identity: impl Into<String>) {
        self.workers.write().insert(identity.into());
    }

    /// Remove a worker registration, as if its lease expired.
    pub fn unregister_worker(&self, identity: &str) -> bool {
        self.workers.write().remove(identity)
    }

    /// Drain the kill signals written so far, oldest first.
    pub fn take_kill_signals(&self) -> Vec<String> {
        std::mem::take(&mut *self.kill_signals.lock())
    }
}

#[async_trait]
impl JobCoordinator for InMemoryCoordinator {
    async fn save_job(&self, job: &Job) -> StoreResult<Option<Job>> {
        Ok(self.jobs.write().insert(job.name.clone(), job.clone()))
    }

    async fn delete_job(&self, name: &str) -> StoreResult<Option<Job>> {
        Ok(self.jobs.write().remove(name))
    }

    async fn list_jobs(&self) -> StoreResult<Vec<Job>> {
        Ok(self.jobs.read().values().cloned().collect())
    }

    async fn kill_job(&self, name: &str) -> StoreResult<()> {
        self.kill_signals.lock().push(name.to_string());
        Ok(())
    }

    async fn list_workers(&self) -> StoreResult<Vec<String>> {
        Ok(self.workers.read().iter().cloned().collect())
    }
}
