//! Lifecycle operations
//!
//! Create and delete start work and return. Everything else is rejected
//! with `DriverError::NotSupported`.

use super::{CapiHelmDriver, ClusterDriver, DriverCapability, SyncOutcome};
use crate::error::DriverError;
use crate::values::assemble;
use cluster_model::{Cluster, ClusterTemplate, Federation, NodeGroup};
use helm_client::{InstallOptions, UninstallOptions};
use kube_resources::NAMESPACE;
use openstack_client::RequestContext;
use serde_json::json;
use tracing::{error, info, warn};

fn not_supported(operation: &str) -> DriverError {
    warn!("Rejecting unsupported operation {}", operation);
    DriverError::NotSupported(operation.to_string())
}

#[async_trait::async_trait]
impl ClusterDriver for CapiHelmDriver {
    fn provides(&self) -> Vec<DriverCapability> {
        vec![DriverCapability {
            server_type: "vm",
            os: "ubuntu",
            coe: "kubernetes",
        }]
    }

    async fn create_cluster(&self, context: &RequestContext, cluster: &Cluster) -> Result<(), DriverError> {
        info!("Starting to create cluster {}", cluster.uuid);

        let namespace = self.namespace(cluster);
        self.resources.apply(&NAMESPACE, &namespace, json!({}), None).await?;

        // The chart reads the credential secrets, so they go in first
        self.provision_credentials(context, cluster).await?;

        let template = &cluster.cluster_template;
        let image = self.images.resolve_image(context, &template.image_id).await?;
        let values = assemble(cluster, template, &image.id)?;

        let options = InstallOptions {
            namespace: Some(namespace),
            repo: Some(self.config.chart_repo.clone()),
            version: Some(self.config.chart_version.clone()),
            ..Default::default()
        };
        let release = self
            .helm
            .install_or_upgrade(&Self::release_name(cluster), &self.config.chart_name, &[values], &options)
            .await
            .map_err(|e| {
                error!("Failed to install release for cluster {}: {}", cluster.uuid, e);
                e
            })?;

        info!(
            "Release {} for cluster {} is at revision {}",
            release.name, cluster.uuid, release.version
        );
        Ok(())
    }

    async fn update_cluster(&self, _context: &RequestContext, cluster: &Cluster, _rollback: bool) -> Result<(), DriverError> {
        info!("Starting to update cluster {}", cluster.uuid);
        Err(not_supported("update_cluster"))
    }

    async fn delete_cluster(&self, _context: &RequestContext, cluster: &Cluster) -> Result<(), DriverError> {
        info!("Starting to delete cluster {}", cluster.uuid);

        let options = UninstallOptions {
            namespace: Some(self.namespace(cluster)),
            ..Default::default()
        };
        self.helm.uninstall_release(&Self::release_name(cluster), &options).await?;
        Ok(())
    }

    async fn resize_cluster(
        &self,
        _context: &RequestContext,
        _cluster: &Cluster,
        _node_count: u32,
        _nodes_to_remove: &[String],
        _nodegroup: Option<&NodeGroup>,
    ) -> Result<(), DriverError> {
        Err(not_supported("resize_cluster"))
    }

    async fn upgrade_cluster(
        &self,
        _context: &RequestContext,
        _cluster: &Cluster,
        _template: &ClusterTemplate,
        _max_batch_size: u32,
        _nodegroup: Option<&NodeGroup>,
        _rollback: bool,
    ) -> Result<(), DriverError> {
        Err(not_supported("upgrade_cluster"))
    }

    async fn create_nodegroup(
        &self,
        _context: &RequestContext,
        _cluster: &Cluster,
        _nodegroup: &NodeGroup,
    ) -> Result<(), DriverError> {
        Err(not_supported("create_nodegroup"))
    }

    async fn update_nodegroup(
        &self,
        _context: &RequestContext,
        _cluster: &Cluster,
        _nodegroup: &NodeGroup,
    ) -> Result<(), DriverError> {
        Err(not_supported("update_nodegroup"))
    }

    async fn delete_nodegroup(
        &self,
        _context: &RequestContext,
        _cluster: &Cluster,
        _nodegroup: &NodeGroup,
    ) -> Result<(), DriverError> {
        Err(not_supported("delete_nodegroup"))
    }

    async fn create_federation(&self, _context: &RequestContext, _federation: &Federation) -> Result<(), DriverError> {
        Err(not_supported("create_federation"))
    }

    async fn update_federation(&self, _context: &RequestContext, _federation: &Federation) -> Result<(), DriverError> {
        Err(not_supported("update_federation"))
    }

    async fn delete_federation(&self, _context: &RequestContext, _federation: &Federation) -> Result<(), DriverError> {
        Err(not_supported("delete_federation"))
    }

    async fn update_cluster_status(
        &self,
        context: &RequestContext,
        cluster: &mut Cluster,
    ) -> Result<SyncOutcome, DriverError> {
        self.sync_status(context, cluster).await
    }
}
