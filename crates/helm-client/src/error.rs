//! Helm client errors

use thiserror::Error;

/// Errors that can occur when running helm
#[derive(Debug, Error)]
pub enum HelmError {
    /// The helm binary could not be started or its pipes failed
    #[error("Failed to run helm: {0}")]
    Io(#[from] std::io::Error),

    /// helm exited with a non-zero status
    #[error("helm {command} failed with exit code {code:?}: {stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// Values could not be encoded or helm's JSON output could not be decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl HelmError {
    /// True when helm reported that the release does not exist.
    pub fn is_release_not_found(&self) -> bool {
        match self {
            HelmError::CommandFailed { stderr, .. } => stderr.contains("release: not found"),
            _ => false,
        }
    }
}
