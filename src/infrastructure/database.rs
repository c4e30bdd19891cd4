// Database Interface - One connection per operation against ClimateData
// Every operation opens its own connection and closes it before returning

use crate::config::{Backend, DatabaseConfig};
use crate::error::{AppError, AppResult};
use crate::infrastructure::mysql_database::MySqlStore;
use crate::infrastructure::sqlite_database::SqliteStore;
use crate::models::ClimateRecord;
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::Serialize;
use sqlx::Connection;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Identifier generated by the database for an inserted row
pub type RowId = u64;

/// Store interface for the climate workload
#[async_trait]
pub trait ClimateStore: Send + Sync {
    fn backend(&self) -> Backend;

    /// Insert one record and commit; returns the generated row id.
    async fn insert_record(&self, record: &ClimateRecord) -> AppResult<RowId>;

    /// Count rows whose temperature is strictly above `threshold`.
    async fn count_hot_days(&self, threshold: f64) -> AppResult<u64>;

    /// Add `step` to humidity for rows at `locations`, never exceeding `cap`,
    /// and commit; returns the number of affected rows.
    async fn raise_humidity(&self, locations: &[String], step: f64, cap: f64) -> AppResult<u64>;

    async fn count_rows(&self) -> AppResult<u64>;

    fn connection_stats(&self) -> ConnectionSnapshot;
}

/// Open/close counters shared by every operation of a store
#[derive(Debug, Default)]
pub struct ConnectionStats {
    opened: AtomicU64,
    closed: AtomicU64,
    failed_connects: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConnectionSnapshot {
    pub opened: u64,
    pub closed: u64,
    pub failed_connects: u64,
}

impl ConnectionSnapshot {
    /// Connections opened but not yet closed
    pub fn in_flight(&self) -> u64 {
        self.opened.saturating_sub(self.closed)
    }
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ConnectionSnapshot {
        ConnectionSnapshot {
            opened: self.opened.load(Ordering::SeqCst),
            closed: self.closed.load(Ordering::SeqCst),
            failed_connects: self.failed_connects.load(Ordering::SeqCst),
        }
    }

    fn record_open(&self) {
        self.opened.fetch_add(1, Ordering::SeqCst);
    }

    fn record_close(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }

    fn record_failed_connect(&self) {
        self.failed_connects.fetch_add(1, Ordering::SeqCst);
    }
}

/// Run `op` on a freshly opened connection and close the connection on
/// every exit path, whether `op` succeeded or not.
pub(crate) async fn with_connection<C, T, Fut, F>(
    stats: &ConnectionStats,
    connect: Fut,
    op: F,
) -> AppResult<T>
where
    C: Connection,
    Fut: Future<Output = Result<C, sqlx::Error>>,
    F: for<'c> FnOnce(&'c mut C) -> BoxFuture<'c, AppResult<T>>,
{
    let mut conn = connect.await.map_err(|e| {
        stats.record_failed_connect();
        AppError::DatabaseError(format!("Failed to connect: {}", e))
    })?;
    stats.record_open();
    let released = ReleaseOnDrop(stats);

    let result = op(&mut conn).await;

    // A failed close still releases the socket when the connection drops.
    if let Err(e) = conn.close().await {
        warn!("Failed to close connection cleanly: {}", e);
    }
    drop(released);
    debug!(ok = result.is_ok(), "connection released");

    result
}

/// Counts the connection as closed however `with_connection` exits,
/// including when `op` panics and the connection is dropped unclosed.
struct ReleaseOnDrop<'s>(&'s ConnectionStats);

impl Drop for ReleaseOnDrop<'_> {
    fn drop(&mut self) {
        self.0.record_close();
    }
}

/// Convert a COUNT(*) value into a row count
pub(crate) fn to_row_count(count: i64) -> AppResult<u64> {
    u64::try_from(count)
        .map_err(|_| AppError::DatabaseError(format!("Negative row count returned: {}", count)))
}

/// Build the store matching the configured backend
pub async fn connect_store(config: &DatabaseConfig) -> AppResult<Arc<dyn ClimateStore>> {
    let store: Arc<dyn ClimateStore> = match config.backend() {
        Backend::MySql => Arc::new(MySqlStore::from_config(config)?),
        Backend::Sqlite => {
            let url = config.url.as_deref().unwrap_or_default();
            Arc::new(SqliteStore::from_url(url)?)
        }
    };
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_in_flight() {
        let stats = ConnectionStats::new();
        stats.record_open();
        stats.record_open();
        stats.record_close();
        stats.record_failed_connect();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.opened, 2);
        assert_eq!(snapshot.closed, 1);
        assert_eq!(snapshot.failed_connects, 1);
        assert_eq!(snapshot.in_flight(), 1);
    }

    #[test]
    fn test_to_row_count() {
        assert_eq!(to_row_count(0).unwrap(), 0);
        assert_eq!(to_row_count(42).unwrap(), 42);
        assert!(to_row_count(-1).is_err());
    }

    #[tokio::test]
    async fn test_with_connection_counts_failed_connect() {
        let stats = ConnectionStats::new();
        let result: AppResult<()> = with_connection(
            &stats,
            async { Err::<sqlx::SqliteConnection, _>(sqlx::Error::PoolTimedOut) },
            |_conn| Box::pin(async { Ok(()) }),
        )
        .await;

        assert!(result.is_err());
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.opened, 0);
        assert_eq!(snapshot.closed, 0);
        assert_eq!(snapshot.failed_connects, 1);
    }

    #[tokio::test]
    async fn test_with_connection_releases_on_panic() {
        use sqlx::sqlite::SqliteConnectOptions;
        use sqlx::ConnectOptions;
        use std::str::FromStr;

        let stats = Arc::new(ConnectionStats::new());
        let options = SqliteConnectOptions::from_str("sqlite::memory:").unwrap();

        let task_stats = stats.clone();
        let handle = tokio::spawn(async move {
            let result: AppResult<()> =
                with_connection(&task_stats, options.connect(), |_conn| {
                    Box::pin(async {
                        if true {
                            panic!("statement blew up");
                        }
                        Ok(())
                    })
                })
                .await;
            result
        });

        assert!(handle.await.unwrap_err().is_panic());
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.opened, 1);
        assert_eq!(snapshot.closed, 1);
        assert_eq!(snapshot.in_flight(), 0);
    }
}
