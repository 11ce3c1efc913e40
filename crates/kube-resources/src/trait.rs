//! ResourceClient trait for mocking
//!
//! The driver depends on this trait rather than on `KubeResourceClient`
//! directly, so tests can substitute the in-memory mock.

use crate::error::ResourceError;
use crate::kind::ResourceKind;
use kube::api::DynamicObject;
use serde_json::Value;

/// Operations the driver needs from the declarative-state API.
///
/// Every method asserts `kind.assert_scope(namespace)` before doing any I/O.
#[async_trait::async_trait]
pub trait ResourceClientTrait: Send + Sync {
    /// Fetches an object. A 404 is `Ok(None)`.
    async fn fetch(
        &self,
        kind: &ResourceKind,
        name: &str,
        namespace: Option<&str>,
    ) -> Result<Option<DynamicObject>, ResourceError>;

    /// Server-side applies `body`, filling in apiVersion, kind, name and namespace.
    async fn apply(
        &self,
        kind: &ResourceKind,
        name: &str,
        body: Value,
        namespace: Option<&str>,
    ) -> Result<DynamicObject, ResourceError>;

    /// Deletes an object. Absence is not an error.
    async fn delete(
        &self,
        kind: &ResourceKind,
        name: &str,
        namespace: Option<&str>,
    ) -> Result<(), ResourceError>;

    /// Deletes every object carrying `label=value`, without waiting for finalizers.
    async fn delete_all_by_label(
        &self,
        kind: &ResourceKind,
        label: &str,
        value: &str,
        namespace: Option<&str>,
    ) -> Result<(), ResourceError>;
}
