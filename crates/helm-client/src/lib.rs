//! Helm client
//!
//! Wraps the `helm` binary to converge a named release on a chart and a set
//! of value overlays. Installs are `helm upgrade --install`, so the same call
//! is safe on every reconciliation pass; uninstalling a release that does not
//! exist succeeds.
//!
//! Value overlays are deep-merged with [`mergeconcat`] (objects merge, lists
//! concatenate, later scalars win) and handed to helm on stdin, never on the
//! command line, so credentials embedded in values do not show up in process
//! listings.
//!
//! # Example
//!
//! ```no_run
//! use helm_client::{HelmClient, HelmClientTrait, HelmSettings, InstallOptions};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let helm = HelmClient::new(HelmSettings::default());
//! let options = InstallOptions {
//!     namespace: Some("magnum-abc123".to_string()),
//!     repo: Some("https://stackhpc.github.io/capi-helm-charts".to_string()),
//!     ..Default::default()
//! };
//! let release = helm
//!     .install_or_upgrade("my-cluster", "openstack-cluster", &[json!({"controlPlane": {"machineCount": 3}})], &options)
//!     .await?;
//! println!("{} is {}", release.name, release.info.status);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
#[path = "trait.rs"]
pub mod helm_trait;
pub mod values;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use client::{HelmClient, HelmSettings, InstallOptions, Release, ReleaseInfo, UninstallOptions};
pub use error::HelmError;
pub use helm_trait::HelmClientTrait;
pub use values::mergeconcat;
#[cfg(any(test, feature = "test-util"))]
pub use mock::{InstallCall, MockHelmClient, UninstallCall};
