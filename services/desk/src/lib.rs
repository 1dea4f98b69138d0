pub mod adapters;
pub mod config;
pub mod console;
pub mod error;

use adapters::{JsonFileStorage, MemoryBlobStore, MemoryStorage};
use config::{Config, StorageKind};
use error::DeskError;
use std::sync::Arc;
use study_desk_core::ports::KeyValueStore;
use study_desk_core::StudyStore;
use tracing::info;

/// Builds the storage adapter named by the configuration and loads the store from it.
pub async fn open_store(config: &Config) -> Result<StudyStore, DeskError> {
    let storage: Arc<dyn KeyValueStore> = match config.storage {
        StorageKind::File => {
            let storage = JsonFileStorage::open(&config.data_dir).await?;
            info!("Persisting to {}", storage.dir().display());
            Arc::new(storage)
        }
        StorageKind::Memory => {
            info!("Using in-memory storage; nothing will be kept after exit");
            Arc::new(MemoryStorage::new())
        }
    };
    let blobs = Arc::new(MemoryBlobStore::new());
    Ok(StudyStore::load(config.store_config(), storage, blobs).await)
}
