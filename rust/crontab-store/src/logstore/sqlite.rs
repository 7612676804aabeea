//! `SQLite` backend for the execution log.
//!
//! Each record is stored as a bincode document in the `job_logs` table, with
//! `job_name` and `start_time` copied into indexed columns:
//!
//! ```text
//! job_logs(id, job_name, start_time, document BLOB, created_at)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use crontab_store::SqliteLogStore;
//!
//! let store = SqliteLogStore::open("./data/cron-logs.db", Duration::from_secs(5)).await?;
//! store.insert_many(&records).await?;
//! let page = store.find(&LogFind::newest_first("job1", 0, 20)).await?;
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use tokio::task;

use super::{LogDocument, LogFind, LogStore, SortOrder};
use crate::error::{StoreError, StoreResult};
use crate::model::JobLog;

/// SQLite-based execution log store.
///
/// A single connection is opened up front and shared by all callers; the
/// blocking work of each call runs on the blocking thread pool.
#[derive(Debug, Clone)]
pub struct SqliteLogStore {
    /// Path to the database file, or `:memory:`.
    db_path: PathBuf,
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLogStore {
    /// Open (creating if needed) the log database.
    ///
    /// `connect_timeout` bounds how long a statement waits on a locked
    /// database before failing.
    pub async fn open<P: Into<PathBuf>>(path: P, connect_timeout: Duration) -> StoreResult<Self> {
        let db_path = path.into();
        let open_path = db_path.clone();

        let conn = task::spawn_blocking(move || -> StoreResult<Connection> {
            let conn = Connection::open(&open_path).map_err(query_error("open database"))?;
            conn.busy_timeout(connect_timeout)
                .map_err(query_error("set busy timeout"))?;
            migrate_schema(&conn)?;
            Ok(conn)
        })
        .await??;

        tracing::debug!(path = %db_path.display(), "Opened log store");

        Ok(Self {
            db_path,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Path of the underlying database.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.db_path
    }

    /// Store a raw document without encoding it.
    pub async fn insert_document(
        &self,
        job_name: impl Into<String>,
        start_time: i64,
        data: Vec<u8>,
    ) -> StoreResult<()> {
        let job_name = job_name.into();
        let conn = Arc::clone(&self.conn);

        task::spawn_blocking(move || -> StoreResult<()> {
            let conn = conn.lock();
            conn.execute(
                "INSERT INTO job_logs (job_name, start_time, document, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![job_name, start_time, data, chrono::Utc::now().timestamp()],
            )
            .map_err(write_error("insert document"))?;
            Ok(())
        })
        .await?
    }
}

/// Create the `job_logs` table and its index.
fn migrate_schema(conn: &Connection) -> StoreResult<()> {
    // WAL is unavailable for in-memory databases; the pragma then reports "memory".
    conn.pragma_update(None, "journal_mode", "WAL").ok();

    conn.execute(
        r"
        CREATE TABLE IF NOT EXISTS job_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            job_name TEXT NOT NULL,
            start_time INTEGER NOT NULL,
            document BLOB NOT NULL,
            created_at INTEGER NOT NULL
        )
        ",
        [],
    )
    .map_err(query_error("create job_logs table"))?;

    conn.execute(
        r"
        CREATE INDEX IF NOT EXISTS idx_job_logs_name_start
        ON job_logs(job_name, start_time)
        ",
        [],
    )
    .map_err(query_error("create job_logs index"))?;

    Ok(())
}

fn query_error(context: &'static str) -> impl Fn(rusqlite::Error) -> StoreError {
    move |e| StoreError::Query(format!("{context}: {e}"))
}

fn write_error(context: &'static str) -> impl Fn(rusqlite::Error) -> StoreError {
    move |e| StoreError::Write(format!("{context}: {e}"))
}

/// `LIMIT`/`OFFSET` operand; values past `i64::MAX` mean "everything".
fn sql_bound(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait]
impl LogStore for SqliteLogStore {
    async fn insert_many(&self, records: &[JobLog]) -> StoreResult<usize> {
        let rows = records
            .iter()
            .map(|record| Ok((record.job_name.clone(), record.start_time, record.to_document()?)))
            .collect::<StoreResult<Vec<_>>>()?;
        let conn = Arc::clone(&self.conn);

        task::spawn_blocking(move || -> StoreResult<usize> {
            let mut conn = conn.lock();
            let tx = conn.transaction().map_err(write_error("begin transaction"))?;
            let now = chrono::Utc::now().timestamp();
            {
                let mut stmt = tx
                    .prepare(
                        "INSERT INTO job_logs (job_name, start_time, document, created_at) VALUES (?1, ?2, ?3, ?4)",
                    )
                    .map_err(write_error("prepare insert"))?;
                for (job_name, start_time, document) in &rows {
                    stmt.execute(params![job_name, start_time, document, now])
                        .map_err(write_error("insert record"))?;
                }
            }
            tx.commit().map_err(write_error("commit batch"))?;
            Ok(rows.len())
        })
        .await?
    }

    async fn find(&self, query: &LogFind) -> StoreResult<Vec<LogDocument>> {
        let sql = match query.sort {
            SortOrder::Ascending => {
                "SELECT document FROM job_logs WHERE job_name = ?1 ORDER BY start_time ASC, id ASC LIMIT ?2 OFFSET ?3"
            }
            SortOrder::Descending => {
                "SELECT document FROM job_logs WHERE job_name = ?1 ORDER BY start_time DESC, id ASC LIMIT ?2 OFFSET ?3"
            }
        };
        let job_name = query.filter.job_name.clone();
        let limit = sql_bound(query.limit);
        let skip = sql_bound(query.skip);
        let conn = Arc::clone(&self.conn);

        // Statement and row cursor are dropped inside the closure on every path.
        task::spawn_blocking(move || -> StoreResult<Vec<LogDocument>> {
            let conn = conn.lock();
            let mut stmt = conn.prepare(sql).map_err(query_error("prepare find"))?;
            let rows = stmt
                .query_map(params![job_name, limit, skip], |row| row.get::<_, Vec<u8>>(0))
                .map_err(query_error("execute find"))?;

            let mut documents = Vec::new();
            for data in rows {
                let data = data.map_err(query_error("read row"))?;
                documents.push(LogDocument { data });
            }
            Ok(documents)
        })
        .await?
    }

    async fn ping(&self) -> StoreResult<()> {
        let conn = Arc::clone(&self.conn);
        task::spawn_blocking(move || -> StoreResult<()> {
            conn.lock()
                .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                .map_err(query_error("ping"))?;
            Ok(())
        })
        .await?
    }
}
