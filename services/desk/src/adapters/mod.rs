pub mod file_storage;
pub mod memory;

pub use file_storage::JsonFileStorage;
pub use memory::{MemoryBlobStore, MemoryStorage};
