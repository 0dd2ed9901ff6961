use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Storage backend trait
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Write an object under the given key
    async fn put(&self, key: &str, data: Bytes) -> Result<()>;

    /// Read an object
    async fn get(&self, key: &str) -> Result<Bytes>;

    /// Delete an object. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check whether an object exists
    async fn exists(&self, key: &str) -> Result<bool>;
}
