//! Durable Store Implementation using Tokio

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::DurableStore,
};
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

const APP_DIR_NAME: &str = "pocket-music";
const TEMP_SUFFIX: &str = ".tmp";

/// File-backed durable store
///
/// Each key maps to one file directly under the root directory. Writes go to
/// a sibling temp file that is flushed and then renamed over the target, so a
/// reader never observes a partially written record.
pub struct FileDurableStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FileDurableStore {
    /// Create a store rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Create a store under the platform data directory.
    pub fn in_default_location(subdir: &str) -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".local")
                    .join("share")
            })
            .join(APP_DIR_NAME)
            .join(subdir);

        Self::new(data_dir)
    }

    /// Map a logical key to a file name that cannot escape the root.
    fn coordinate_key(key: &str) -> Result<String> {
        if key.is_empty() {
            return Err(BridgeError::OperationFailed(
                "durable store key cannot be empty".to_string(),
            ));
        }

        Ok(key.replace(['/', '\\'], "|"))
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        Ok(self.root.join(Self::coordinate_key(key)?))
    }

    async fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }
}

#[async_trait]
impl DurableStore for FileDurableStore {
    async fn root_directory(&self) -> Result<PathBuf> {
        self.ensure_root().await?;
        Ok(self.root.clone())
    }

    async fn write(&self, key: &str, value: Bytes) -> Result<()> {
        let target = self.path_for(key)?;
        let temp = self
            .root
            .join(format!(".{}{}", Self::coordinate_key(key)?, TEMP_SUFFIX));

        let _guard = self.write_lock.lock().await;
        self.ensure_root().await?;

        let mut file = fs::File::create(&temp).await?;
        file.write_all(value.as_ref()).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        if let Err(e) = fs::rename(&temp, &target).await {
            let _ = fs::remove_file(&temp).await;
            return Err(e.into());
        }

        debug!(key, size = value.len(), "Wrote record");
        Ok(())
    }

    async fn read_or_none(&self, key: &str) -> Result<Option<Bytes>> {
        let path = self.path_for(key)?;

        match fs::read(&path).await {
            Ok(data) => {
                debug!(key, size = data.len(), "Read record");
                Ok(Some(Bytes::from(data)))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.path_for(key)?;
        Ok(fs::try_exists(&path).await?)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(key, "Deleted record");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
