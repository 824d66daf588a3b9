use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::{KeyedStore, Result};
use crate::models::Record;

const EXTENSION: &str = ".json";

/// Keyed store holding one `<id>.json` file per record
#[derive(Debug, Clone)]
pub struct FileStore {
    directory: PathBuf,
}

impl FileStore {
    /// Open the store, creating `directory` if needed
    pub async fn open(directory: impl Into<PathBuf>) -> Result<Self> {
        let directory = directory.into();
        tokio::fs::create_dir_all(&directory).await?;
        tracing::info!(directory = %directory.display(), "Opened file store");
        Ok(Self { directory })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path_for(&self, id: Uuid) -> PathBuf {
        self.directory.join(format!("{}{}", id, EXTENSION))
    }
}

#[async_trait]
impl KeyedStore for FileStore {
    async fn put(&self, record: &Record) -> Result<()> {
        // Readers never see a half-written file; concurrent puts still race on the rename.
        let target = self.path_for(record.id());
        let staging = self
            .directory
            .join(format!(".{}.{}.tmp", record.id(), Uuid::new_v4()));

        tokio::fs::write(&staging, record.to_json()).await?;
        if let Err(e) = tokio::fs::rename(&staging, &target).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Record>> {
        match tokio::fs::read_to_string(self.path_for(id)).await {
            Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_ids(&self) -> Result<Vec<Uuid>> {
        let mut entries = tokio::fs::read_dir(&self.directory).await?;
        let mut ids = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let id = name
                .to_str()
                .and_then(|n| n.strip_suffix(EXTENSION))
                .and_then(|stem| Uuid::parse_str(stem).ok());
            if let Some(id) = id {
                ids.push(id);
            }
        }

        Ok(ids)
    }
}
