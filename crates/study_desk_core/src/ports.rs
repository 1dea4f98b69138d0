//! crates/study_desk_core/src/ports.rs
//!
//! Defines the service contracts (traits) the store depends on.
//! These traits keep the core independent of where bytes actually live:
//! a directory of JSON files, an in-memory map, or a browser's local storage.

use async_trait::async_trait;
use bytes::Bytes;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Durable key-value storage. Every write replaces the whole value for a key.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns `None` when nothing has been stored under `key`.
    async fn get(&self, key: &str) -> PortResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> PortResult<()>;

    /// Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> PortResult<()>;
}

/// Hands out opaque references standing in for uploaded bytes.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn create_reference(&self, data: Bytes, mime_type: &str) -> PortResult<String>;

    /// Lets the backend drop the bytes behind a reference once nothing points at it.
    async fn release(&self, _url: &str) -> PortResult<()> {
        Ok(())
    }
}
