//! services/desk/src/error.rs
//!
//! Defines the primary error type for the desk service.

use crate::config::ConfigError;
use study_desk_core::ports::PortError;
use study_desk_core::StoreError;

/// The primary error type for the `desk` service.
#[derive(Debug, thiserror::Error)]
pub enum DeskError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error returned by a store operation.
    #[error("{0}")]
    Store(#[from] StoreError),

    /// Represents a standard Input/Output error (e.g., reading an upload or stdin).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}
