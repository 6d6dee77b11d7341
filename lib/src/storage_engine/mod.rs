// lib/src/storage_engine/mod.rs

pub mod inmemory_storage;
pub mod sled_storage;
pub mod storage_engine;
pub mod storage_utils;

pub use inmemory_storage::InMemoryStorage;
pub use sled_storage::SledStorage;
pub use storage_engine::{ChangeEvent, ChangeFeed, ChangeKind, DocumentStore};

use std::sync::Arc;

use anyhow::Result;
use log::info;

use crate::config::{StorageConfig, StorageEngineType};

/// Creates a storage engine instance based on the provided configuration.
pub fn create_storage(config: &StorageConfig) -> Result<Arc<dyn DocumentStore>> {
    let storage: Arc<dyn DocumentStore> = match config.storage_engine_type {
        StorageEngineType::Sled => {
            let path = config.data_directory.join("sled");
            Arc::new(SledStorage::new(&path)?)
        }
        StorageEngineType::InMemory => Arc::new(InMemoryStorage::new()),
    };
    info!("Using {} storage engine", storage.get_type());
    Ok(storage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_selects_engine() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = StorageConfig::default();
        assert_eq!(create_storage(&config).unwrap().get_type(), "InMemory");

        config.storage_engine_type = StorageEngineType::Sled;
        config.data_directory = dir.path().to_path_buf();
        assert_eq!(create_storage(&config).unwrap().get_type(), "Sled");
    }
}
