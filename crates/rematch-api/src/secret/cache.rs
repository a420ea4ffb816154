use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;

/// Persisted secret record: `{"secret": "...", "timestamp": <epoch millis>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedSecret {
    pub secret: String,
    pub timestamp: u64,
}

/// On-disk store for the one cached signing secret.
#[derive(Debug, Clone)]
pub struct SecretCache {
    path: PathBuf,
}

impl SecretCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the cached record. Any read or parse problem reads as an absent
    /// cache so the caller falls back to extraction.
    pub async fn load(&self) -> Option<CachedSecret> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "failed to read secret cache");
                return None;
            }
        };
        match serde_json::from_slice::<CachedSecret>(&bytes) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "discarding unreadable secret cache");
                None
            }
        }
    }

    /// Persists the record, replacing any previous one. Written to a sibling
    /// temp file first so a crash mid-write cannot leave a truncated record.
    pub async fn store(&self, record: &CachedSecret) -> Result<()> {
        let json = serde_json::to_vec(record)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, &json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Deletes the persisted record. A missing file is not an error.
    pub async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
