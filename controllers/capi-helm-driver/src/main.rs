//! Cluster API Helm Driver
//!
//! Standalone status poller: loads cluster records from the file store and
//! moves each in-progress cluster to its terminal state once Cluster API
//! reports it converged (or gone, for deletes).

use anyhow::Context;
use capi_helm_driver::config::cluster_store_dir;
use capi_helm_driver::{CapiHelmDriver, ClusterStore, DriverConfig, FileClusterStore, OpenStackSettings, Poller};
use helm_client::HelmClient;
use kube_resources::KubeResourceClient;
use openstack_client::{CertificateClient, IdentityClient, ImageClient, Session};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    info!("Starting Cluster API Helm driver");

    let config = DriverConfig::from_env().context("Invalid driver configuration")?;
    let openstack = OpenStackSettings::from_env().context("Invalid OpenStack configuration")?;

    info!("Configuration:");
    info!("  Chart: {}/{} {}", config.chart_repo, config.chart_name, config.chart_version);
    info!("  Namespace template: {}", config.namespace_template);
    info!("  Keystone: {}", openstack.auth_url);

    let store_dir = cluster_store_dir(|key| std::env::var(key).ok());
    let store: Arc<dyn ClusterStore> = Arc::new(
        FileClusterStore::open(&store_dir)
            .await
            .with_context(|| format!("Failed to open cluster store {}", store_dir.display()))?,
    );
    info!("  Cluster store: {}", store_dir.display());

    let resources = KubeResourceClient::try_default(config.field_manager.clone())
        .await
        .context("Failed to create Kubernetes client")?;

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .context("Failed to create HTTP client")?;
    let session = Arc::new(Session::new(
        http,
        openstack.auth_url.clone(),
        openstack.application_credential_id.clone(),
        openstack.application_credential_secret.clone(),
    ));

    let driver = CapiHelmDriver::new(
        config.clone(),
        Box::new(resources),
        Box::new(HelmClient::new(config.helm.clone())),
        Box::new(IdentityClient::new(Arc::clone(&session))),
        Box::new(CertificateClient::new(Arc::clone(&session), openstack.key_manager_url.clone())),
        Box::new(ImageClient::new(session, openstack.image_url.clone())),
        Arc::clone(&store),
    );

    let poller = Poller::new(Arc::new(driver), store, &config);
    poller
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await;

    Ok(())
}
