pub mod local;
pub mod provider;

pub use local::*;
pub use provider::*;

use std::sync::Arc;

use crate::config::StorageConfig;

/// Builds the storage backend from configuration
pub fn from_config(config: &StorageConfig) -> Arc<dyn StorageProvider> {
    Arc::new(LocalStorage::new(&config.local_path))
}
