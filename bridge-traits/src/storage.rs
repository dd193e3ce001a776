//! Durable Storage Abstraction
//!
//! Provides a platform-agnostic trait for process-private, restart-surviving
//! key/value blob storage.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;

use crate::error::Result;

/// Durable key-addressed blob store
///
/// Abstracts the host's private persistence area:
/// - Android: `noBackupFilesDir`
/// - iOS: Application Support (excluded from backup)
/// - Desktop: platform data directory
///
/// Keys are opaque strings. Values are opaque bytes; typed records are layered
/// on top by the caller. Data survives app restarts but not an explicit
/// user-initiated data clear.
///
/// # Write semantics
///
/// `write` replaces the whole record. Implementations MUST NOT leave a
/// partially written value visible to a later `read_or_none`, even if the
/// process is killed mid-write: a reader observes either the previous value,
/// the new value, or no value.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::DurableStore;
///
/// async fn remember(store: &dyn DurableStore, data: &[u8]) -> Result<()> {
///     store.write("playlist_0", Bytes::copy_from_slice(data)).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Directory that backs this store
    ///
    /// Stable for the lifetime of the installation.
    async fn root_directory(&self) -> Result<PathBuf>;

    /// Replace the value stored under `key`
    async fn write(&self, key: &str, value: Bytes) -> Result<()>;

    /// Read the value stored under `key`
    ///
    /// # Returns
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    async fn read_or_none(&self, key: &str) -> Result<Option<Bytes>>;

    /// Check if a value exists without reading it
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.read_or_none(key).await?.is_some())
    }

    /// Delete the value stored under `key`
    ///
    /// Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;
}
