//! In-memory log store for testing and local runs.

use std::cmp::Reverse;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{LogDocument, LogFind, LogStore, SortOrder};
use crate::error::StoreResult;
use crate::model::JobLog;

#[derive(Debug, Clone)]
struct StoredLog {
    job_name: String,
    start_time: i64,
    document: LogDocument,
}

/// In-memory log store.
///
/// Documents with equal `start_time` keep their insertion order.
#[derive(Debug, Default)]
pub struct InMemoryLogStore {
    logs: RwLock<Vec<StoredLog>>,
}

impl InMemoryLogStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw document without encoding it.
    ///
    /// Lets callers place documents written by other producers, including
    /// ones that do not decode.
    pub fn insert_document(&self, job_name: impl Into<String>, start_time: i64, data: Vec<u8>) {
        self.logs.write().push(StoredLog {
            job_name: job_name.into(),
            start_time,
            document: LogDocument { data },
        });
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.logs.read().len()
    }

    /// Whether the store holds no documents.
    pub fn is_empty(&self) -> bool {
        self.logs.read().is_empty()
    }
}

#[async_trait]
impl LogStore for InMemoryLogStore {
    async fn insert_many(&self, records: &[JobLog]) -> StoreResult<usize> {
        let encoded = records
            .iter()
            .map(|record| {
                Ok(StoredLog {
                    job_name: record.job_name.clone(),
                    start_time: record.start_time,
                    document: LogDocument {
                        data: record.to_document()?,
                    },
                })
            })
            .collect::<StoreResult<Vec<_>>>()?;

        let count = encoded.len();
        self.logs.write().extend(encoded);
        Ok(count)
    }

    async fn find(&self, query: &LogFind) -> StoreResult<Vec<LogDocument>> {
        let logs = self.logs.read();
        let mut matching: Vec<&StoredLog> = logs
            .iter()
            .filter(|log| log.job_name == query.filter.job_name)
            .collect();

        // Stable sorts keep insertion order among equal start times.
        match query.sort {
            SortOrder::Ascending => matching.sort_by_key(|log| log.start_time),
            SortOrder::Descending => matching.sort_by_key(|log| Reverse(log.start_time)),
        }

        let skip = usize::try_from(query.skip).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.limit).unwrap_or(usize::MAX);
        Ok(matching
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|log| log.document.clone())
            .collect())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_at(job_name: &str, start_time: i64) -> JobLog {
        JobLog {
            job_name: job_name.to_string(),
            command: "echo hi".to_string(),
            err_output: None,
            output: String::new(),
            plan_time: start_time,
            schedule_time: start_time,
            start_time,
            end_time: start_time + 1,
        }
    }

    fn start_times(documents: &[LogDocument]) -> Vec<i64> {
        documents
            .iter()
            .map(|doc| doc.decode().unwrap().start_time)
            .collect()
    }

    #[tokio::test]
    async fn test_find_filters_sorts_and_pages() {
        let store = InMemoryLogStore::new();
        store
            .insert_many(&[log_at("job1", 10), log_at("job2", 99), log_at("job1", 30), log_at("job1", 20)])
            .await
            .unwrap();

        let page = store.find(&LogFind::newest_first("job1", 0, 2)).await.unwrap();
        assert_eq!(start_times(&page), vec![30, 20]);

        let page = store.find(&LogFind::newest_first("job1", 2, 2)).await.unwrap();
        assert_eq!(start_times(&page), vec![10]);
    }

    #[tokio::test]
    async fn test_find_ascending() {
        let store = InMemoryLogStore::new();
        store
            .insert_many(&[log_at("job1", 30), log_at("job1", 10)])
            .await
            .unwrap();

        let mut query = LogFind::newest_first("job1", 0, 10);
        query.sort = SortOrder::Ascending;
        assert_eq!(start_times(&store.find(&query).await.unwrap()), vec![10, 30]);
    }

    #[tokio::test]
    async fn test_find_unknown_job_is_empty() {
        let store = InMemoryLogStore::new();
        store.insert_many(&[log_at("job1", 1)]).await.unwrap();
        assert!(store
            .find(&LogFind::newest_first("ghost", 0, 20))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_raw_documents_are_returned_undecoded() {
        let store = InMemoryLogStore::new();
        store.insert_document("job1", 5, vec![1, 2, 3]);
        assert_eq!(store.len(), 1);

        let page = store.find(&LogFind::newest_first("job1", 0, 20)).await.unwrap();
        assert_eq!(page, vec![LogDocument { data: vec![1, 2, 3] }]);
        assert!(page[0].decode().is_err());
    }
}
