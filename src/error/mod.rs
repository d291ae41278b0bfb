//! Error types for wicket.

use thiserror::Error;

use crate::session::AuthError;
use crate::storage::StorageError;
use crate::token::DecodeError;

/// Primary error type for all wicket operations.
///
/// Most session operations never return this: failures raised inside an
/// operation are converted into the `error` field of the relevant state cell.
/// What does surface here: structural token-decode failures, the
/// `NotInitialized` guard, and configuration/storage problems.
#[derive(Error, Debug)]
pub enum WicketError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Token decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, WicketError>;
