//! services/desk/src/adapters/memory.rs
//!
//! In-process adapters: a `KeyValueStore` backed by a map, and a `BlobStore`
//! that keeps uploaded bytes until they are released or the process exits.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use study_desk_core::ports::{BlobStore, KeyValueStore, PortResult};
use tokio::sync::RwLock;
use uuid::Uuid;

pub const BLOB_URL_PREFIX: &str = "blob:study-desk/";

/// A `KeyValueStore` that forgets everything when dropped.
#[derive(Default)]
pub struct MemoryStorage {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStorage {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> PortResult<()> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        self.values.write().await.remove(key);
        Ok(())
    }
}

/// A blob registry standing in for the browser's object URLs.
/// References are only meaningful inside the process that issued them.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Bytes>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn create_reference(&self, data: Bytes, _mime_type: &str) -> PortResult<String> {
        let url = format!("{}{}", BLOB_URL_PREFIX, Uuid::new_v4());
        self.blobs.write().await.insert(url.clone(), data);
        Ok(url)
    }

    async fn release(&self, url: &str) -> PortResult<()> {
        self.blobs.write().await.remove(url);
        Ok(())
    }
}
