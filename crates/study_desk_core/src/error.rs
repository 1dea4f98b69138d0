//! crates/study_desk_core/src/error.rs
//!
//! Typed failures returned by the store's operations.

use crate::ports::PortError;

/// Bad input shape. Always recoverable and reported straight back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationFailure {
    #[error("Username must be at least {min} characters")]
    UsernameTooShort { min: usize },
    #[error("Usernames cannot contain '@'; use a username, not an email")]
    MalformedUsername,
    #[error("Username '{0}' already exists")]
    DuplicateUsername(String),
    #[error("Event title cannot be empty")]
    EmptyTitle,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthFailure {
    #[error("Emails are not allowed. Please use your username.")]
    MalformedUsername,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Login was cancelled")]
    Cancelled,
}

/// A view change refused by the session state machine. The view is left as it was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationRefused {
    #[error("Log in first")]
    NotAuthenticated,
    #[error("The admin portal is only available to admin accounts")]
    AdminOnly,
    #[error("Use logout to return to the login screen")]
    UseLogout,
}

/// The error type for all `StudyStore` operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    #[error(transparent)]
    Auth(#[from] AuthFailure),

    #[error(transparent)]
    Navigation(#[from] NavigationRefused),

    /// The current user may not touch the user table.
    #[error("Only admin accounts can manage users")]
    Forbidden,

    /// The backend rejected a write; in-memory state was left unchanged.
    #[error("Persistence error: {0}")]
    Persistence(#[from] PortError),
}

/// A convenience type alias for `Result<T, StoreError>`.
pub type StoreResult<T> = Result<T, StoreError>;
