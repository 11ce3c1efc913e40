//! HelmClient trait for mocking
//!
//! The driver depends on this trait so unit tests can swap in `MockHelmClient`
//! instead of shelling out to a real helm binary.

use crate::client::{InstallOptions, Release, UninstallOptions};
use crate::error::HelmError;
use serde_json::Value;

/// Trait for helm release operations
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait HelmClientTrait: Send + Sync {
    /// Installs the release, or upgrades it if it already exists.
    ///
    /// `values` are merged left to right with `mergeconcat` before being
    /// handed to helm.
    async fn install_or_upgrade(
        &self,
        release_name: &str,
        chart_ref: &str,
        values: &[Value],
        options: &InstallOptions,
    ) -> Result<Release, HelmError>;

    /// Uninstalls the release. A release that does not exist is not an error.
    async fn uninstall_release(
        &self,
        release_name: &str,
        options: &UninstallOptions,
    ) -> Result<(), HelmError>;
}
