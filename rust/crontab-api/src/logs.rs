//! Execution log query engine.
//!
//! Turns a job name and pagination parameters into a newest-first `Find`
//! against the log store and decodes the documents it returns.

use std::sync::Arc;

use crontab_store::{JobLog, LogFind, LogStore, StoreResult};

/// `skip` used when the parameter is missing or not an integer.
pub const DEFAULT_SKIP: i64 = 0;

/// `limit` used when the parameter is missing or not an integer.
pub const DEFAULT_LIMIT: i64 = 20;

/// Pagination parameters of a log query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub skip: i64,
    pub limit: i64,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            skip: DEFAULT_SKIP,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageParams {
    /// Parse raw transport values.
    ///
    /// Anything that is not a base-10 integer falls back to the default for
    /// that parameter; parsing never fails.
    #[must_use]
    pub fn parse(skip: Option<&str>, limit: Option<&str>) -> Self {
        Self {
            skip: parse_or(skip, DEFAULT_SKIP),
            limit: parse_or(limit, DEFAULT_LIMIT),
        }
    }
}

fn parse_or(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(|value| value.parse().ok()).unwrap_or(default)
}

/// Query engine over the execution log store.
#[derive(Debug, Clone)]
pub struct LogQueryEngine {
    store: Arc<dyn LogStore>,
}

impl LogQueryEngine {
    /// Create an engine over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn LogStore>) -> Self {
        Self { store }
    }

    /// Records of job `name`, newest `start_time` first, after dropping
    /// `skip` records and keeping at most `limit`.
    ///
    /// `name` is not checked against the job registry. A non-positive
    /// `limit` yields an empty page and a negative `skip` counts as zero.
    /// Only a failure to run the query is returned as an error.
    pub async fn list_log(&self, name: &str, skip: i64, limit: i64) -> StoreResult<Vec<JobLog>> {
        let limit = u64::try_from(limit).unwrap_or(0);
        if limit == 0 {
            return Ok(Vec::new());
        }
        let skip = u64::try_from(skip).unwrap_or(0);

        let documents = self
            .store
            .find(&LogFind::newest_first(name, skip, limit))
            .await?;

        let mut records = Vec::with_capacity(documents.len());
        for document in documents {
            match document.decode() {
                Ok(record) => records.push(record),
                // Skip and continue: a corrupt record is left out of the page.
                Err(e) => {
                    tracing::warn!(job = %name, error = %e, "Skipping malformed log record");
                }
            }
        }

        tracing::debug!(job = %name, skip, limit, returned = records.len(), "Log query completed");
        Ok(records)
    }

    /// Check that the log store is reachable.
    pub async fn ping(&self) -> StoreResult<()> {
        self.store.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crontab_store::{InMemoryLogStore, LogDocument, StoreError};

    fn log_at(start_time: i64) -> JobLog {
        JobLog {
            job_name: "job1".to_string(),
            command: "echo hi".to_string(),
            err_output: None,
            output: "hi".to_string(),
            plan_time: start_time,
            schedule_time: start_time,
            start_time,
            end_time: start_time,
        }
    }

    async fn engine_with(records: &[JobLog]) -> (Arc<InMemoryLogStore>, LogQueryEngine) {
        let store = Arc::new(InMemoryLogStore::new());
        store.insert_many(records).await.unwrap();
        let engine = LogQueryEngine::new(Arc::clone(&store) as Arc<dyn LogStore>);
        (store, engine)
    }

    fn start_times(records: &[JobLog]) -> Vec<i64> {
        records.iter().map(|r| r.start_time).collect()
    }

    #[test]
    fn test_page_params_defaults_on_garbage() {
        assert_eq!(PageParams::parse(Some("abc"), Some("1.5")), PageParams::default());
        assert_eq!(PageParams::parse(None, None), PageParams { skip: 0, limit: 20 });
        assert_eq!(PageParams::parse(Some(""), Some(" 3")), PageParams::default());
    }

    #[test]
    fn test_page_params_parse_integers() {
        assert_eq!(
            PageParams::parse(Some("5"), Some("10")),
            PageParams { skip: 5, limit: 10 }
        );
        assert_eq!(
            PageParams::parse(Some("+2"), Some("-1")),
            PageParams { skip: 2, limit: -1 }
        );
    }

    #[tokio::test]
    async fn test_list_log_pages_newest_first() {
        let (_store, engine) = engine_with(&[log_at(10), log_at(20), log_at(30)]).await;

        assert_eq!(start_times(&engine.list_log("job1", 0, 2).await.unwrap()), vec![30, 20]);
        assert_eq!(start_times(&engine.list_log("job1", 2, 2).await.unwrap()), vec![10]);
        assert!(engine.list_log("job1", 3, 2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_log_respects_limit() {
        let records: Vec<JobLog> = (0..50).map(log_at).collect();
        let (_store, engine) = engine_with(&records).await;

        for limit in [0_i64, 1, 7, 20, 49, 50, 80] {
            let page = engine.list_log("job1", 0, limit).await.unwrap();
            assert!(page.len() <= usize::try_from(limit).unwrap());
            assert!(page.windows(2).all(|w| w[0].start_time >= w[1].start_time));
        }
    }

    #[tokio::test]
    async fn test_negative_bounds() {
        let (_store, engine) = engine_with(&[log_at(1), log_at(2)]).await;
        assert!(engine.list_log("job1", 0, -5).await.unwrap().is_empty());
        assert_eq!(start_times(&engine.list_log("job1", -3, 20).await.unwrap()), vec![2, 1]);
    }

    #[tokio::test]
    async fn test_unknown_job_is_empty_not_error() {
        let (_store, engine) = engine_with(&[log_at(1)]).await;
        assert!(engine.list_log("deleted-job", 0, 20).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_records_are_skipped() {
        let (store, engine) = engine_with(&[log_at(10), log_at(30)]).await;
        store.insert_document("job1", 20, b"not a document".to_vec());

        let page = engine.list_log("job1", 0, 20).await.unwrap();
        assert_eq!(start_times(&page), vec![30, 10]);
    }

    #[derive(Debug)]
    struct UnreachableStore;

    #[async_trait]
    impl LogStore for UnreachableStore {
        async fn insert_many(&self, _records: &[JobLog]) -> StoreResult<usize> {
            Err(StoreError::Write("connection refused".to_string()))
        }

        async fn find(&self, _query: &LogFind) -> StoreResult<Vec<LogDocument>> {
            Err(StoreError::Query("connection refused".to_string()))
        }

        async fn ping(&self) -> StoreResult<()> {
            Err(StoreError::Query("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_query_failure_surfaces() {
        let engine = LogQueryEngine::new(Arc::new(UnreachableStore));
        let err = engine.list_log("job1", 0, 20).await.unwrap_err();
        assert!(matches!(err, StoreError::Query(_)));
        assert!(engine.ping().await.is_err());
    }
}
