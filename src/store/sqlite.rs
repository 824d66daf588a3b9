//! SQLite-backed ranged store
//!
//! Every push is a single INSERT, so concurrent pushes are serialized by
//! SQLite itself. The autoincrement `seq` column fixes the list order: index 0
//! is the highest `seq`.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

use super::{inclusive_window, RangedStore, Result, StoreError};
use crate::models::Record;

pub struct SqliteLogList {
    pool: SqlitePool,
}

impl SqliteLogList {
    /// Connect and run migrations
    ///
    /// # Example
    ///
    /// ```ignore
    /// let list = SqliteLogList::connect("sqlite:./data/logs.db", 5).await?;
    /// ```
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        // Parse connection options
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal) // Readers don't block the writer
            .busy_timeout(Duration::from_secs(30)); // Wait up to 30s for the write lock

        // Each connection to an in-memory database gets its own copy
        let in_memory = database_url.contains(":memory:");
        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { max_connections.max(1) })
            .acquire_timeout(Duration::from_secs(30));
        if in_memory {
            // Dropping the only connection would drop the database with it
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }

        let pool = pool_options.connect_with(options).await?;

        // Run migrations
        sqlx::migrate!("./migrations").run(&pool).await?;

        tracing::info!(database_url, "Opened SQLite log list");
        Ok(Self { pool })
    }
}

#[async_trait]
impl RangedStore for SqliteLogList {
    async fn push(&self, record: &Record) -> Result<()> {
        sqlx::query("INSERT INTO logs (log_id, payload) VALUES (?, ?)")
            .bind(record.id().to_string())
            .bind(record.to_json())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn length(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM logs")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    async fn range(&self, start: u64, end: u64) -> Result<Vec<Record>> {
        let Some((offset, limit)) = inclusive_window(start, end) else {
            return Ok(Vec::new());
        };

        // SQLite integers are signed; anything past i64::MAX is past the tail anyway
        let payloads: Vec<String> =
            sqlx::query_scalar("SELECT payload FROM logs ORDER BY seq DESC LIMIT ? OFFSET ?")
                .bind(i64::try_from(limit).unwrap_or(i64::MAX))
                .bind(i64::try_from(offset).unwrap_or(i64::MAX))
                .fetch_all(&self.pool)
                .await?;

        payloads
            .iter()
            .map(|payload| serde_json::from_str::<Record>(payload).map_err(StoreError::from))
            .collect()
    }

    async fn find(&self, id: Uuid) -> Result<Option<Record>> {
        let payload: Option<String> = sqlx::query_scalar(
            "SELECT payload FROM logs WHERE log_id = ? ORDER BY seq DESC LIMIT 1",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match payload {
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_line;
    use std::sync::Arc;

    async fn memory_list() -> SqliteLogList {
        SqliteLogList::connect("sqlite::memory:", 5).await.unwrap()
    }

    fn record(pid: u32) -> Record {
        parse_line(&format!(
            "id={} service_name=api process=api.{} sample#load_avg_1m=0.{}",
            Uuid::new_v4(),
            pid,
            pid
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn test_push_and_range_newest_first() {
        let list = memory_list().await;
        let records: Vec<Record> = (1..=7).map(record).collect();
        for r in &records {
            list.push(r).await.unwrap();
        }

        assert_eq!(list.length().await.unwrap(), 7);

        let window = list.range(0, 10).await.unwrap();
        assert_eq!(window.len(), 7);
        assert_eq!(window[0], records[6]);
        assert_eq!(window[6], records[0]);

        let window = list.range(1, 2).await.unwrap();
        assert_eq!(window, vec![records[5].clone(), records[4].clone()]);
    }

    #[tokio::test]
    async fn test_range_outside_list() {
        let list = memory_list().await;
        list.push(&record(1)).await.unwrap();

        assert!(list.range(5, 10).await.unwrap().is_empty());
        assert!(list.range(1, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_range_up_to_u64_max() {
        let list = memory_list().await;
        let r = record(1);
        list.push(&r).await.unwrap();

        assert_eq!(list.range(0, u64::MAX).await.unwrap(), vec![r]);
        assert!(list.range(u64::MAX, u64::MAX).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_returns_newest_entry() {
        let list = memory_list().await;
        let r = record(3);
        list.push(&r).await.unwrap();
        list.push(&record(4)).await.unwrap();

        assert_eq!(list.find(r.id()).await.unwrap(), Some(r));
        assert_eq!(list.find(Uuid::new_v4()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_concurrent_pushes_keep_every_entry() {
        let list = Arc::new(memory_list().await);
        let mut handles = Vec::new();
        for pid in 0..20 {
            let list = list.clone();
            handles.push(tokio::spawn(async move { list.push(&record(pid)).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(list.length().await.unwrap(), 20);
        assert_eq!(list.range(0, 19).await.unwrap().len(), 20);
    }
}
