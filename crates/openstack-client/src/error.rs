//! OpenStack client errors

use thiserror::Error;

/// Errors that can occur when talking to OpenStack services
#[derive(Debug, Error)]
pub enum OpenStackError {
    /// HTTP request/response error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service returned an unexpected status
    #[error("OpenStack API error: {0}")]
    Api(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Keystone rejected the credentials or the token
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The caller is authenticated but policy denies the operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A lookup by name matched more than one resource
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Private key material could not be decrypted
    #[error("Decryption failed: {0}")]
    Decryption(String),
}

impl OpenStackError {
    /// True for `NotFound`
    pub fn is_not_found(&self) -> bool {
        matches!(self, OpenStackError::NotFound(_))
    }

    /// True when repeating the request unchanged cannot succeed
    pub fn is_permanent(&self) -> bool {
        matches!(self, OpenStackError::Forbidden(_) | OpenStackError::Decryption(_))
    }
}
