//! Job and execution-log records.

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// A named, schedulable unit of work.
///
/// `name` is the identity of the job inside the coordination store: saving a
/// job under an existing name replaces the stored value. A payload without
/// `command` or `cronExpr` decodes with those fields empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Unique job name.
    pub name: String,
    /// Shell command executed on each run.
    #[serde(default)]
    pub command: String,
    /// Five or six field cron expression.
    #[serde(rename = "cronExpr", default)]
    pub cron_expr: String,
}

impl Job {
    /// Create a new job definition.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        command: impl Into<String>,
        cron_expr: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            cron_expr: cron_expr.into(),
        }
    }
}

/// Audit entry for one execution of a job.
///
/// Records are written by the executors once a run completes and are never
/// updated afterwards. All timestamps are Unix milliseconds.
///
/// Fields travel in camelCase, except `err_output` which goes over the wire
/// as `err`. `errOutput` is still accepted when decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobLog {
    /// Name of the job that ran. Not checked against the job registry.
    pub job_name: String,
    /// Snapshot of the command that was executed.
    pub command: String,
    /// Error output, if the run failed.
    #[serde(rename = "err", alias = "errOutput", default)]
    pub err_output: Option<String>,
    /// Captured stdout/stderr.
    pub output: String,
    /// Time the run was planned for.
    pub plan_time: i64,
    /// Time the run was actually dispatched.
    pub schedule_time: i64,
    /// Execution start.
    pub start_time: i64,
    /// Execution end.
    pub end_time: i64,
}

impl JobLog {
    /// Encode the record into its stored binary document form.
    pub fn to_document(&self) -> StoreResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| StoreError::Encode {
            what: "job log",
            reason: e.to_string(),
        })
    }

    /// Decode a record from its stored binary document form.
    pub fn from_document(data: &[u8]) -> StoreResult<Self> {
        bincode::deserialize(data).map_err(|e| StoreError::Decode(e.to_string()))
    }
}
