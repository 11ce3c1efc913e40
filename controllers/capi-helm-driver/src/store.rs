//! Cluster record persistence
//!
//! The driver saves a record after every API address change and every
//! terminal status transition. [`FileClusterStore`] keeps one YAML document
//! per cluster for standalone deployments.

use crate::error::StoreError;
use chrono::Utc;
use cluster_model::Cluster;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Load/save access to cluster records
#[async_trait::async_trait]
pub trait ClusterStore: Send + Sync {
    /// Every stored cluster
    async fn list(&self) -> Result<Vec<Cluster>, StoreError>;

    /// One cluster by uuid; `StoreError::NotFound` when absent
    async fn load(&self, uuid: &str) -> Result<Cluster, StoreError>;

    /// Persists the record, stamping `updated_at` first
    async fn save(&self, cluster: &mut Cluster) -> Result<(), StoreError>;
}

/// Cluster store backed by a directory of `{uuid}.yaml` files
#[derive(Debug, Clone)]
pub struct FileClusterStore {
    dir: PathBuf,
}

impl FileClusterStore {
    /// Open a store, creating the directory if needed
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    /// Directory holding the records
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, uuid: &str) -> PathBuf {
        self.dir.join(format!("{}.yaml", uuid))
    }
}

#[async_trait::async_trait]
impl ClusterStore for FileClusterStore {
    async fn list(&self) -> Result<Vec<Cluster>, StoreError> {
        let mut clusters = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
                continue;
            }
            let text = tokio::fs::read_to_string(&path).await?;
            match serde_yaml::from_str::<Cluster>(&text) {
                Ok(cluster) => clusters.push(cluster),
                // One bad record must not stop the others from being polled
                Err(e) => warn!("Skipping unreadable cluster record {}: {}", path.display(), e),
            }
        }
        clusters.sort_by(|a, b| a.uuid.cmp(&b.uuid));
        Ok(clusters)
    }

    async fn load(&self, uuid: &str) -> Result<Cluster, StoreError> {
        let path = self.path_for(uuid);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(uuid.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_yaml::from_str(&text)?)
    }

    async fn save(&self, cluster: &mut Cluster) -> Result<(), StoreError> {
        cluster.updated_at = Some(Utc::now());
        let text = serde_yaml::to_string(cluster)?;

        let path = self.path_for(&cluster.uuid);
        let tmp = self.dir.join(format!(".{}.yaml.tmp", cluster.uuid));
        tokio::fs::write(&tmp, text).await?;
        tokio::fs::rename(&tmp, &path).await?;

        debug!("Saved cluster {} ({})", cluster.uuid, cluster.status);
        Ok(())
    }
}
