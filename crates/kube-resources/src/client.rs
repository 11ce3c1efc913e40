//! Kubernetes resource client
//!
//! Implements [`ResourceClientTrait`] over `kube::Api<DynamicObject>`,
//! building the API handle per call from a [`ResourceKind`].

use crate::error::ResourceError;
use crate::kind::{build_apply_body, ResourceKind};
use crate::resource_trait::ResourceClientTrait;
use kube::api::{Api, DeleteParams, DynamicObject, ListParams, Patch, PatchParams};
use kube::Client;
use serde_json::Value;
use tracing::debug;

/// Resource client backed by a live Kubernetes API server
#[derive(Clone)]
pub struct KubeResourceClient {
    client: Client,
    field_manager: String,
}

impl KubeResourceClient {
    /// Create a new resource client
    ///
    /// # Arguments
    /// * `client` - Kubernetes client
    /// * `field_manager` - Field manager identity used for server-side apply
    pub fn new(client: Client, field_manager: impl Into<String>) -> Self {
        Self {
            client,
            field_manager: field_manager.into(),
        }
    }

    /// Create a resource client from the ambient kubeconfig / in-cluster config
    pub async fn try_default(field_manager: impl Into<String>) -> Result<Self, ResourceError> {
        let client = Client::try_default().await?;
        Ok(Self::new(client, field_manager))
    }

    /// Field manager identity used for server-side apply
    pub fn field_manager(&self) -> &str {
        &self.field_manager
    }

    fn api(&self, kind: &ResourceKind, namespace: Option<&str>) -> Api<DynamicObject> {
        let ar = kind.api_resource();
        match namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, &ar),
            None => Api::all_with(self.client.clone(), &ar),
        }
    }
}

#[async_trait::async_trait]
impl ResourceClientTrait for KubeResourceClient {
    async fn fetch(
        &self,
        kind: &ResourceKind,
        name: &str,
        namespace: Option<&str>,
    ) -> Result<Option<DynamicObject>, ResourceError> {
        kind.assert_scope(namespace);
        debug!("GET {}", kind.path(Some(name), namespace));

        match self.api(kind, namespace).get(name).await {
            Ok(object) => Ok(Some(object)),
            Err(kube::Error::Api(ae)) if ae.code == 404 => {
                debug!("{} {} not found", kind.kind, name);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn apply(
        &self,
        kind: &ResourceKind,
        name: &str,
        body: Value,
        namespace: Option<&str>,
    ) -> Result<DynamicObject, ResourceError> {
        kind.assert_scope(namespace);
        debug!("APPLY {} as {}", kind.path(Some(name), namespace), self.field_manager);

        let body = build_apply_body(kind, name, namespace, body)?;
        let params = PatchParams::apply(&self.field_manager).force();
        let object = self
            .api(kind, namespace)
            .patch(name, &params, &Patch::Apply(&body))
            .await?;
        Ok(object)
    }

    async fn delete(
        &self,
        kind: &ResourceKind,
        name: &str,
        namespace: Option<&str>,
    ) -> Result<(), ResourceError> {
        kind.assert_scope(namespace);
        debug!("DELETE {}", kind.path(Some(name), namespace));

        match self.api(kind, namespace).delete(name, &DeleteParams::default()).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(ae)) if ae.code == 404 => {
                debug!("{} {} already absent", kind.kind, name);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_all_by_label(
        &self,
        kind: &ResourceKind,
        label: &str,
        value: &str,
        namespace: Option<&str>,
    ) -> Result<(), ResourceError> {
        kind.assert_scope(namespace);
        let selector = format!("{}={}", label, value);
        debug!("DELETE {}?labelSelector={}", kind.path(None, namespace), selector);

        self.api(kind, namespace)
            .delete_collection(&DeleteParams::default(), &ListParams::default().labels(&selector))
            .await?;
        Ok(())
    }
}
