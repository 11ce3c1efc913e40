//! Status state machine
//!
//! | entry state          | CAPI cluster | action                                  |
//! |----------------------|--------------|-----------------------------------------|
//! | CREATE/UPDATE_IN_PROGRESS | absent  | pending                                 |
//! | CREATE/UPDATE_IN_PROGRESS | present | record API address; complete when ready |
//! | DELETE_IN_PROGRESS   | present      | pending                                 |
//! | DELETE_IN_PROGRESS   | absent       | deprovision credentials; complete       |
//! | anything else        | -            | ignored                                 |
//!
//! There is no transition to a FAILED state: Cluster API keeps retrying, so
//! a cluster that never converges stays in progress.

use super::{CapiHelmDriver, SyncOutcome};
use crate::error::DriverError;
use cluster_model::Cluster;
use kube_resources::{CAPI_CLUSTER, CapiClusterView, DynamicObject};
use openstack_client::RequestContext;
use tracing::{debug, info};

impl CapiHelmDriver {
    pub(crate) async fn sync_status(&self, context: &RequestContext, cluster: &mut Cluster) -> Result<SyncOutcome, DriverError> {
        if !cluster.status.needs_sync() {
            return Ok(SyncOutcome::Ignored);
        }

        let namespace = self.namespace(cluster);
        let capi_cluster = self
            .resources
            .fetch(&CAPI_CLUSTER, &Self::release_name(cluster), Some(&namespace))
            .await?;

        if cluster.status.is_converging() {
            debug!("Checking on an update for {}", cluster.uuid);
            match capi_cluster {
                None => Ok(SyncOutcome::Pending),
                Some(object) => self.sync_converging(cluster, &object).await,
            }
        } else {
            debug!("Checking on a delete for {}", cluster.uuid);
            match capi_cluster {
                Some(_) => Ok(SyncOutcome::Pending),
                None => self.sync_deleted(context, cluster).await,
            }
        }
    }

    async fn sync_converging(&self, cluster: &mut Cluster, object: &DynamicObject) -> Result<SyncOutcome, DriverError> {
        let view = CapiClusterView::from_object(object)?;

        // Published as soon as it is known so users can reach a cluster that
        // is still converging
        if let Some(api_address) = view.api_address() {
            if cluster.api_address.as_deref() != Some(api_address.as_str()) {
                info!("Cluster {} API address is {}", cluster.uuid, api_address);
                cluster.api_address = Some(api_address);
                self.store.save(cluster).await?;
            }
        }

        if !view.is_ready() {
            return Ok(SyncOutcome::Pending);
        }
        self.complete(cluster).await
    }

    async fn sync_deleted(&self, context: &RequestContext, cluster: &mut Cluster) -> Result<SyncOutcome, DriverError> {
        self.deprovision_credentials(context, cluster).await?;
        self.complete(cluster).await
    }

    async fn complete(&self, cluster: &mut Cluster) -> Result<SyncOutcome, DriverError> {
        let Some(status) = cluster.status.completed() else {
            return Ok(SyncOutcome::Ignored);
        };
        info!("Cluster {} is now {}", cluster.uuid, status);
        cluster.status = status;
        cluster.status_reason = None;
        self.store.save(cluster).await?;
        Ok(SyncOutcome::Completed(status))
    }
}
