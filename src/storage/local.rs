use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::storage::StorageProvider;

/// Local file system storage backend
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Resolves a key under the base path. Keys come straight from
    /// request paths, so parent-directory segments are rejected.
    fn full_path(&self, key: &str) -> Result<PathBuf> {
        if key.split('/').any(|seg| seg == "..") {
            return Err(AppError::BadRequest("Invalid file path".to_string()));
        }
        Ok(self.base_path.join(key))
    }
}

#[async_trait]
impl StorageProvider for LocalStorage {
    async fn put(&self, key: &str, data: Bytes) -> Result<()> {
        let full_path = self.full_path(key)?;

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&full_path).await?;
        file.write_all(&data).await?;
        file.flush().await?;

        tracing::debug!("Saved file to {:?}", full_path);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Bytes> {
        let full_path = self.full_path(key)?;

        let data = fs::read(&full_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::NotFound(format!("File not found: {}", key))
            } else {
                AppError::Storage(format!("Failed to read file: {}", e))
            }
        })?;

        Ok(Bytes::from(data))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let full_path = self.full_path(key)?;

        if full_path.exists() {
            fs::remove_file(&full_path).await?;
            tracing::debug!("Deleted file {:?}", full_path);

            // Remove parent directories that became empty
            let mut current_dir = full_path.parent().map(|p| p.to_path_buf());
            while let Some(dir) = current_dir {
                if dir == self.base_path {
                    break;
                }
                match fs::read_dir(&dir).await {
                    Ok(mut entries) => {
                        if entries.next_entry().await?.is_some() {
                            break;
                        }
                        let _ = fs::remove_dir(&dir).await;
                    }
                    Err(_) => break,
                }
                current_dir = dir.parent().map(|p| p.to_path_buf());
            }
        }

        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let full_path = self.full_path(key)?;
        Ok(full_path.exists())
    }
}
