//! Cluster API Helm Driver
//!
//! Converges Kubernetes clusters on OpenStack by installing the
//! `openstack-cluster` Helm chart into a management cluster and watching the
//! Cluster API `Cluster` it produces.
//!
//! # Example
//!
//! ```no_run
//! use capi_helm_driver::{CapiHelmDriver, ClusterDriver, RequestContext};
//! # async fn example(driver: CapiHelmDriver, mut cluster: cluster_model::Cluster, token: String) -> Result<(), Box<dyn std::error::Error>> {
//! let context = RequestContext::for_user(cluster.user_id.clone(), cluster.project_id.clone(), token);
//! driver.create_cluster(&context, &cluster).await?;
//! let outcome = driver.update_cluster_status(&RequestContext::service(), &mut cluster).await?;
//! println!("{:?}", outcome);
//! # Ok(())
//! # }
//! ```

pub mod backoff;
pub mod config;
pub mod credentials;
pub mod driver;
pub mod error;
pub mod poller;
pub mod store;
pub mod values;

#[cfg(test)]
mod test_utils;

pub use config::{DriverConfig, OpenStackSettings};
pub use driver::{CapiHelmDriver, ClusterDriver, DriverCapability, SyncOutcome};
pub use error::{DriverError, StoreError};
pub use openstack_client::RequestContext;
pub use poller::{PollSummary, Poller};
pub use store::{ClusterStore, FileClusterStore};
