//! Local filesystem history store.
//!
//! The history is a single JSON document:
//!
//! ```text
//! {
//!   "updated_at": "2026-10-18T06:00:00Z",
//!   "count": 2,
//!   "packages": ["libfoo-cfd", "mricron"]
//! }
//! ```
//!
//! Writes go to a sibling temp file which is then renamed over the
//! target, so a crash mid-write leaves the previous history intact.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::storage::{HistoryFile, HistorySet, HistoryStore};

/// History stored in a JSON file.
#[derive(Debug, Clone)]
pub struct LocalHistoryStore {
    path: PathBuf,
}

impl LocalHistoryStore {
    /// Create a store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }

    /// Sibling temp file: the full file name plus `.tmp`.
    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        self.ensure_dir().await?;

        let tmp = self.temp_path();
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read the full history document, if any.
    pub async fn load_file(&self) -> Result<Option<HistoryFile>> {
        match self.read_bytes().await? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| AppError::history(self.location(), e)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl HistoryStore for LocalHistoryStore {
    async fn load(&self) -> Result<HistorySet> {
        match self.load_file().await? {
            Some(file) => {
                log::debug!(
                    "Loaded {} reported packages from {}",
                    file.packages.len(),
                    self.location()
                );
                Ok(file.packages)
            }
            None => {
                log::info!("No history at {}, starting empty", self.location());
                Ok(HistorySet::new())
            }
        }
    }

    async fn save(&self, history: &HistorySet) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(&HistoryFile::new(history.clone()))?;
        self.write_bytes(&bytes).await?;
        log::info!(
            "History: {} packages written to {}",
            history.len(),
            self.location()
        );
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
