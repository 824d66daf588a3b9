//! Record persistence
//!
//! Two store shapes back the two deployment variants:
//!
//! - [`KeyedStore`]: one slot per record id, point lookups and id listing.
//!   Writes to the same id race and the last one wins.
//! - [`RangedStore`]: append-only list where the newest record sits at index 0,
//!   read back by inclusive offset windows.
//!
//! The ingest pipeline only sees [`RecordSink`], which [`Backend`] implements
//! for either shape.

pub mod file;
pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::models::Record;

pub use file::FileStore;
pub use memory::{MemoryKeyedStore, MemoryLogList};
pub use sqlite::SqliteLogList;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Malformed JSON or a payload that is not a valid log
    #[error("stored entry is not a valid log: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait KeyedStore: Send + Sync {
    /// Persist `record` under its id, replacing any previous entry
    async fn put(&self, record: &Record) -> Result<()>;

    async fn get(&self, id: Uuid) -> Result<Option<Record>>;

    /// Every stored id, in the medium's enumeration order
    async fn list_ids(&self) -> Result<Vec<Uuid>>;
}

#[async_trait]
pub trait RangedStore: Send + Sync {
    /// Insert at the head of the list as one atomic operation
    async fn push(&self, record: &Record) -> Result<()>;

    async fn length(&self) -> Result<u64>;

    /// Entries at indices `start..=end`, newest first. Indices past the tail
    /// are simply absent from the result.
    async fn range(&self, start: u64, end: u64) -> Result<Vec<Record>>;

    /// Newest entry carrying `id`
    async fn find(&self, id: Uuid) -> Result<Option<Record>>;
}

/// Write side of a store, as seen by the ingest pipeline
#[async_trait]
pub trait RecordSink: Send + Sync {
    fn name(&self) -> &'static str;

    async fn write(&self, record: &Record) -> Result<()>;
}

/// The store handle chosen at startup and shared by every request
#[derive(Clone)]
pub enum Backend {
    Keyed(Arc<dyn KeyedStore>),
    Ranged(Arc<dyn RangedStore>),
}

impl Backend {
    pub async fn get(&self, id: Uuid) -> Result<Option<Record>> {
        match self {
            Self::Keyed(store) => store.get(id).await,
            Self::Ranged(store) => store.find(id).await,
        }
    }
}

#[async_trait]
impl RecordSink for Backend {
    fn name(&self) -> &'static str {
        match self {
            Self::Keyed(_) => "keyed",
            Self::Ranged(_) => "ranged",
        }
    }

    async fn write(&self, record: &Record) -> Result<()> {
        match self {
            Self::Keyed(store) => store.put(record).await,
            Self::Ranged(store) => store.push(record).await,
        }
    }
}

/// Offset and row count for the inclusive window `start..=end`
///
/// The count saturates at `u64::MAX` for the full `0..=u64::MAX` window.
pub(crate) fn inclusive_window(start: u64, end: u64) -> Option<(u64, u64)> {
    if end < start {
        return None;
    }
    Some((start, (end - start).saturating_add(1)))
}
