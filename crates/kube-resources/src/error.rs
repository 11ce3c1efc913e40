//! Resource client errors

use thiserror::Error;

/// Errors that can occur when talking to the Kubernetes API
#[derive(Debug, Error)]
pub enum ResourceError {
    /// Kubernetes API error (anything other than the tolerated 404s)
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// Building or decoding an object body failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The object exists but does not have the expected shape
    #[error("Malformed object: {0}")]
    Malformed(String),
}
