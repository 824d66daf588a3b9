use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::VecDeque;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{inclusive_window, KeyedStore, RangedStore, Result};
use crate::models::Record;

/// In-process keyed store
#[derive(Debug, Default)]
pub struct MemoryKeyedStore {
    records: DashMap<Uuid, Record>,
}

impl MemoryKeyedStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyedStore for MemoryKeyedStore {
    async fn put(&self, record: &Record) -> Result<()> {
        self.records.insert(record.id(), record.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Record>> {
        Ok(self.records.get(&id).map(|entry| entry.value().clone()))
    }

    async fn list_ids(&self) -> Result<Vec<Uuid>> {
        Ok(self.records.iter().map(|entry| *entry.key()).collect())
    }
}

/// In-process append-only list, newest entry at the front
#[derive(Debug, Default)]
pub struct MemoryLogList {
    entries: Mutex<VecDeque<Record>>,
}

impl MemoryLogList {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RangedStore for MemoryLogList {
    async fn push(&self, record: &Record) -> Result<()> {
        self.entries.lock().await.push_front(record.clone());
        Ok(())
    }

    async fn length(&self) -> Result<u64> {
        Ok(self.entries.lock().await.len() as u64)
    }

    async fn range(&self, start: u64, end: u64) -> Result<Vec<Record>> {
        let Some((offset, limit)) = inclusive_window(start, end) else {
            return Ok(Vec::new());
        };

        let entries = self.entries.lock().await;
        Ok(entries
            .iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Record>> {
        let entries = self.entries.lock().await;
        Ok(entries.iter().find(|record| record.id() == id).cloned())
    }
}
