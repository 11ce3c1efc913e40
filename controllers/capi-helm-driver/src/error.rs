//! Driver error types.
//!
//! Wraps the errors of every collaborator and adds the driver's own
//! failure kinds.

use helm_client::HelmError;
use kube_resources::ResourceError;
use openstack_client::OpenStackError;
use thiserror::Error;

/// Errors raised by the cluster store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Cluster not found: {0}")]
    NotFound(String),
}

/// Errors that can occur while driving a cluster's lifecycle.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Resource(#[from] ResourceError),

    /// helm failed
    #[error("Helm error: {0}")]
    Helm(#[from] HelmError),

    /// OpenStack service error
    #[error("OpenStack error: {0}")]
    OpenStack(#[from] OpenStackError),

    /// Cluster store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// cloud configuration could not be rendered
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The operation is not implemented by this driver
    #[error("Operation not supported by the Cluster API driver: {0}")]
    NotSupported(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No CA bundle could be read
    #[error("CA bundle unavailable: {0}")]
    CaBundle(String),
}

impl DriverError {
    /// False for errors that will fail the same way on every attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            DriverError::NotSupported(_) | DriverError::InvalidConfig(_) => false,
            DriverError::OpenStack(e) => !e.is_permanent(),
            _ => true,
        }
    }
}
