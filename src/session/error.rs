use thiserror::Error;

/// Normalized authentication errors for session operations.
///
/// One guard policy everywhere: any operation that needs the provider returns
/// `NotInitialized` when it has not been constructed yet. No silent no-ops.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Session client not initialized")]
    NotInitialized,
    #[error("Not logged in")]
    NotLoggedIn,
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

impl From<url::ParseError> for AuthError {
    fn from(error: url::ParseError) -> Self {
        Self::InvalidUrl(error.to_string())
    }
}
