//! Cluster lifecycle driver.
//!
//! [`ClusterDriver`] is the lifecycle interface the API layer calls;
//! [`CapiHelmDriver`] implements it by installing the `openstack-cluster`
//! chart and reading the resulting Cluster API `Cluster` back.
//!
//! - `lifecycle`: create/delete and the rejected operations
//! - `status`: the status state machine run on every poll

mod lifecycle;
mod status;
#[cfg(test)]
mod status_test;

use crate::config::DriverConfig;
use crate::error::DriverError;
use crate::store::ClusterStore;
use cluster_model::{Cluster, ClusterStatus, ClusterTemplate, Federation, NodeGroup, namespace_for, sanitized_name};
use helm_client::HelmClientTrait;
use kube_resources::ResourceClientTrait;
use openstack_client::{CertificateClientTrait, IdentityClientTrait, ImageClientTrait, RequestContext};
use serde::Serialize;
use std::sync::Arc;

/// A server type / OS / COE combination the driver can build
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriverCapability {
    pub server_type: &'static str,
    pub os: &'static str,
    pub coe: &'static str,
}

/// Result of one status pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Not converged yet; poll again later
    Pending,
    /// Reached a terminal state, which has been saved
    Completed(ClusterStatus),
    /// The status has nothing to reconcile
    Ignored,
}

/// Lifecycle operations on clusters.
///
/// Operations start work and return; convergence is detected by later
/// `update_cluster_status` calls. `context` identifies the user the
/// operation is made for; periodic status passes use the service context.
#[async_trait::async_trait]
pub trait ClusterDriver: Send + Sync {
    /// Combinations this driver can build
    fn provides(&self) -> Vec<DriverCapability>;

    async fn create_cluster(&self, context: &RequestContext, cluster: &Cluster) -> Result<(), DriverError>;

    async fn update_cluster(&self, context: &RequestContext, cluster: &Cluster, rollback: bool) -> Result<(), DriverError>;

    async fn delete_cluster(&self, context: &RequestContext, cluster: &Cluster) -> Result<(), DriverError>;

    async fn resize_cluster(
        &self,
        context: &RequestContext,
        cluster: &Cluster,
        node_count: u32,
        nodes_to_remove: &[String],
        nodegroup: Option<&NodeGroup>,
    ) -> Result<(), DriverError>;

    async fn upgrade_cluster(
        &self,
        context: &RequestContext,
        cluster: &Cluster,
        template: &ClusterTemplate,
        max_batch_size: u32,
        nodegroup: Option<&NodeGroup>,
        rollback: bool,
    ) -> Result<(), DriverError>;

    async fn create_nodegroup(
        &self,
        context: &RequestContext,
        cluster: &Cluster,
        nodegroup: &NodeGroup,
    ) -> Result<(), DriverError>;

    async fn update_nodegroup(
        &self,
        context: &RequestContext,
        cluster: &Cluster,
        nodegroup: &NodeGroup,
    ) -> Result<(), DriverError>;

    async fn delete_nodegroup(
        &self,
        context: &RequestContext,
        cluster: &Cluster,
        nodegroup: &NodeGroup,
    ) -> Result<(), DriverError>;

    async fn create_federation(&self, context: &RequestContext, federation: &Federation) -> Result<(), DriverError>;

    async fn update_federation(&self, context: &RequestContext, federation: &Federation) -> Result<(), DriverError>;

    async fn delete_federation(&self, context: &RequestContext, federation: &Federation) -> Result<(), DriverError>;

    /// Moves an in-progress cluster to its terminal state once converged.
    async fn update_cluster_status(
        &self,
        context: &RequestContext,
        cluster: &mut Cluster,
    ) -> Result<SyncOutcome, DriverError>;
}

/// Drives clusters through Cluster API using a Helm chart.
pub struct CapiHelmDriver {
    pub(crate) config: DriverConfig,
    pub(crate) resources: Box<dyn ResourceClientTrait>,
    pub(crate) helm: Box<dyn HelmClientTrait>,
    pub(crate) identity: Box<dyn IdentityClientTrait>,
    pub(crate) certificates: Box<dyn CertificateClientTrait>,
    pub(crate) images: Box<dyn ImageClientTrait>,
    pub(crate) store: Arc<dyn ClusterStore>,
}

impl std::fmt::Debug for CapiHelmDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapiHelmDriver")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CapiHelmDriver {
    /// Creates a new driver from its collaborators.
    pub fn new(
        config: DriverConfig,
        resources: Box<dyn ResourceClientTrait>,
        helm: Box<dyn HelmClientTrait>,
        identity: Box<dyn IdentityClientTrait>,
        certificates: Box<dyn CertificateClientTrait>,
        images: Box<dyn ImageClientTrait>,
        store: Arc<dyn ClusterStore>,
    ) -> Self {
        Self {
            config,
            resources,
            helm,
            identity,
            certificates,
            images,
            store,
        }
    }

    /// Configuration in use
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Store the driver saves records to
    pub fn store(&self) -> Arc<dyn ClusterStore> {
        Arc::clone(&self.store)
    }

    /// Namespace holding the cluster's resources
    pub fn namespace(&self, cluster: &Cluster) -> String {
        namespace_for(&self.config.namespace_template, &cluster.project_id)
    }

    /// Helm release name, which is also the Cluster API cluster name
    pub fn release_name(cluster: &Cluster) -> String {
        sanitized_name(&cluster.name, None)
    }
}
