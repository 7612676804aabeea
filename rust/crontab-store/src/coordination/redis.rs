//! Redis-backed coordination client.
//!
//! Jobs are stored as JSON strings under [`JOB_SAVE_DIR`]. Kill signals are
//! written under [`JOB_KILLER_DIR`] with a short expiry so that they vanish
//! on their own once the workers have seen them. Workers keep their own keys
//! alive under [`JOB_WORKER_DIR`]; an expired key means a dead worker.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;

use super::{job_key, killer_key, JobCoordinator, JOB_SAVE_DIR, JOB_WORKER_DIR};
use crate::error::{StoreError, StoreResult};
use crate::model::Job;

/// Keys requested per `SCAN` round trip.
const SCAN_BATCH: usize = 200;

/// Coordination client sharing one managed Redis connection.
///
/// `ConnectionManager` reconnects on its own and is cheap to clone, so each
/// call works on a clone of the shared handle.
#[derive(Clone)]
pub struct RedisCoordinator {
    conn: ConnectionManager,
    kill_ttl_secs: u64,
}

impl std::fmt::Debug for RedisCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCoordinator")
            .field("conn", &"ConnectionManager")
            .field("kill_ttl_secs", &self.kill_ttl_secs)
            .finish()
    }
}

impl RedisCoordinator {
    /// Connect to Redis, giving up after `connect_timeout`.
    pub async fn connect(
        url: &str,
        connect_timeout: Duration,
        kill_ttl_secs: u64,
    ) -> StoreResult<Self> {
        let client = redis::Client::open(url)?;
        let conn = tokio::time::timeout(connect_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_elapsed| StoreError::ConnectTimeout {
                service: "redis",
                timeout_ms: u64::try_from(connect_timeout.as_millis()).unwrap_or(u64::MAX),
            })??;

        tracing::debug!(url = %url, "Connected to coordination store");

        Ok(Self {
            conn,
            // A zero expiry is rejected by Redis.
            kill_ttl_secs: kill_ttl_secs.max(1),
        })
    }

    /// Collect every key under `prefix`, sorted.
    async fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let mut conn = self.conn.clone();
        let pattern = format!("{prefix}*");
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        // SCAN may repeat keys and returns them in hash order.
        keys.sort();
        keys.dedup();
        Ok(keys)
    }
}

/// Decode a previously stored job.
///
/// A value that no longer parses is reported as absent rather than failing
/// the write that replaced or removed it.
fn decode_previous(key: &str, raw: Option<String>) -> Option<Job> {
    let raw = raw?;
    match serde_json::from_str(&raw) {
        Ok(job) => Some(job),
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Ignoring undecodable previous job value");
            None
        }
    }
}

#[async_trait]
impl JobCoordinator for RedisCoordinator {
    async fn save_job(&self, job: &Job) -> StoreResult<Option<Job>> {
        let key = job_key(&job.name);
        let value = serde_json::to_string(job).map_err(|e| StoreError::Encode {
            what: "job",
            reason: e.to_string(),
        })?;

        let mut conn = self.conn.clone();
        let previous: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg(value)
            .arg("GET")
            .query_async(&mut conn)
            .await?;

        Ok(decode_previous(&key, previous))
    }

    async fn delete_job(&self, name: &str) -> StoreResult<Option<Job>> {
        let key = job_key(name);
        let mut conn = self.conn.clone();
        let previous: Option<String> = redis::cmd("GETDEL")
            .arg(&key)
            .query_async(&mut conn)
            .await?;

        Ok(decode_previous(&key, previous))
    }

    async fn list_jobs(&self) -> StoreResult<Vec<Job>> {
        let keys = self.scan_prefix(JOB_SAVE_DIR).await?;
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.conn.clone();
        let values: Vec<Option<String>> = redis::cmd("MGET")
            .arg(&keys)
            .query_async(&mut conn)
            .await?;

        let mut jobs = Vec::with_capacity(values.len());
        for (key, value) in keys.iter().zip(values) {
            // Deleted between SCAN and MGET.
            let Some(raw) = value else { continue };
            match serde_json::from_str::<Job>(&raw) {
                Ok(job) => jobs.push(job),
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Skipping undecodable job");
                }
            }
        }
        Ok(jobs)
    }

    async fn kill_job(&self, name: &str) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let () = redis::cmd("SET")
            .arg(killer_key(name))
            .arg("")
            .arg("EX")
            .arg(self.kill_ttl_secs)
            .query_async(&mut conn)
            .await?;

        tracing::debug!(job = %name, ttl_secs = self.kill_ttl_secs, "Kill signal written");
        Ok(())
    }

    async fn list_workers(&self) -> StoreResult<Vec<String>> {
        let keys = self.scan_prefix(JOB_WORKER_DIR).await?;
        Ok(keys
            .into_iter()
            .filter_map(|key| key.strip_prefix(JOB_WORKER_DIR).map(str::to_string))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_previous_absent() {
        assert_eq!(decode_previous("/cron/jobs/a", None), None);
    }

    #[test]
    fn test_decode_previous_valid() {
        let raw = r#"{"name":"a","command":"ls","cronExpr":"* * * * *"}"#.to_string();
        assert_eq!(
            decode_previous("/cron/jobs/a", Some(raw)),
            Some(Job::new("a", "ls", "* * * * *"))
        );
    }

    #[test]
    fn test_decode_previous_corrupt_is_absent() {
        assert_eq!(decode_previous("/cron/jobs/a", Some("{oops".to_string())), None);
    }

    #[tokio::test]
    async fn test_connect_rejects_invalid_url() {
        let err = RedisCoordinator::connect("not-a-url", Duration::from_millis(100), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Coordination(_)));
    }

    // Live tests below need a Redis >= 6.2 server:
    // REDIS_URL=redis://127.0.0.1:6379/ cargo test -p crontab-store -- --ignored

    const LIVE_KILL_TTL_SECS: u64 = 5;

    async fn live_coordinator() -> RedisCoordinator {
        let url = std::env::var("REDIS_URL").expect("REDIS_URL must be set for live Redis tests");
        RedisCoordinator::connect(&url, Duration::from_secs(5), LIVE_KILL_TTL_SECS)
            .await
            .unwrap()
    }

    fn unique_name(base: &str) -> String {
        let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
        format!("{base}-{}-{nanos}", std::process::id())
    }

    async fn raw_set(coordinator: &RedisCoordinator, key: &str, value: &str) {
        let mut conn = coordinator.conn.clone();
        let () = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .query_async(&mut conn)
            .await
            .unwrap();
    }

    async fn raw_del(coordinator: &RedisCoordinator, key: &str) {
        let mut conn = coordinator.conn.clone();
        let _: i64 = redis::cmd("DEL").arg(key).query_async(&mut conn).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires a Redis server at REDIS_URL"]
    async fn test_live_save_returns_previous_job() {
        let coordinator = live_coordinator().await;
        let name = unique_name("save");
        let first = Job::new(name.as_str(), "echo hi", "* * * * *");
        let second = Job::new(name.as_str(), "echo bye", "* * * * *");

        assert_eq!(coordinator.save_job(&first).await.unwrap(), None);
        assert_eq!(coordinator.save_job(&second).await.unwrap(), Some(first));

        raw_del(&coordinator, &job_key(&name)).await;
    }

    #[tokio::test]
    #[ignore = "requires a Redis server at REDIS_URL"]
    async fn test_live_delete_returns_removed_job() {
        let coordinator = live_coordinator().await;
        let name = unique_name("delete");
        let job = Job::new(name.as_str(), "true", "*/5 * * * *");
        coordinator.save_job(&job).await.unwrap();

        assert_eq!(coordinator.delete_job(&name).await.unwrap(), Some(job));
        assert_eq!(coordinator.delete_job(&name).await.unwrap(), None);
        assert!(!coordinator
            .list_jobs()
            .await
            .unwrap()
            .iter()
            .any(|j| j.name == name));
    }

    #[tokio::test]
    #[ignore = "requires a Redis server at REDIS_URL"]
    async fn test_live_list_skips_undecodable_jobs() {
        let coordinator = live_coordinator().await;
        let good = Job::new(unique_name("listed").as_str(), "ls", "* * * * *");
        let corrupt_name = unique_name("corrupt");
        coordinator.save_job(&good).await.unwrap();
        raw_set(&coordinator, &job_key(&corrupt_name), "{oops").await;

        let jobs = coordinator.list_jobs().await.unwrap();
        assert!(jobs.contains(&good));
        assert!(!jobs.iter().any(|j| j.name == corrupt_name));

        raw_del(&coordinator, &job_key(&good.name)).await;
        raw_del(&coordinator, &job_key(&corrupt_name)).await;
    }

    #[tokio::test]
    #[ignore = "requires a Redis server at REDIS_URL"]
    async fn test_live_kill_signal_expires() {
        let coordinator = live_coordinator().await;
        let name = unique_name("kill");
        coordinator.kill_job(&name).await.unwrap();

        let mut conn = coordinator.conn.clone();
        let ttl: i64 = redis::cmd("TTL")
            .arg(killer_key(&name))
            .query_async(&mut conn)
            .await
            .unwrap();
        assert!(ttl > 0 && ttl <= i64::try_from(LIVE_KILL_TTL_SECS).unwrap(), "ttl = {ttl}");

        raw_del(&coordinator, &killer_key(&name)).await;
    }

    #[tokio::test]
    #[ignore = "requires a Redis server at REDIS_URL"]
    async fn test_live_workers_are_listed_without_prefix() {
        let coordinator = live_coordinator().await;
        let identity = unique_name("10.0.0.7");
        let key = format!("{JOB_WORKER_DIR}{identity}");
        raw_set(&coordinator, &key, "").await;

        let workers = coordinator.list_workers().await.unwrap();
        assert!(workers.contains(&identity), "{workers:?}");
        assert!(workers.iter().all(|w| !w.starts_with(JOB_WORKER_DIR)));

        raw_del(&coordinator, &key).await;
    }
}
