//! Kubernetes resource client
//!
//! A single client for every resource kind the Cluster API driver touches.
//! Kinds are described by a [`ResourceKind`] value (API version, kind,
//! plural, namespaced) rather than by one type per kind, and every call goes
//! through [`kube::Api<DynamicObject>`](kube::api::DynamicObject).
//!
//! # Example
//!
//! ```no_run
//! use kube_resources::{KubeResourceClient, ResourceClientTrait, NAMESPACE, SECRET};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = KubeResourceClient::try_default("magnum").await?;
//!
//! // Namespaces are cluster-scoped: no namespace argument
//! client.apply(&NAMESPACE, "magnum-abc123", serde_json::json!({}), None).await?;
//!
//! // Secrets are namespaced
//! let secret = client.fetch(&SECRET, "my-cluster-ca", Some("magnum-abc123")).await?;
//! assert!(secret.is_some());
//! # Ok(())
//! # }
//! ```
//!
//! # Semantics
//!
//! - `fetch` maps HTTP 404 to `Ok(None)`
//! - `apply` is server-side apply with a fixed field manager and `force`
//! - `delete` tolerates absence
//! - `delete_all_by_label` issues a collection delete and does not wait
//! - passing a namespace for a cluster-scoped kind (or omitting one for a
//!   namespaced kind) panics

pub mod capi;
pub mod client;
pub mod error;
pub mod kind;
#[path = "trait.rs"]
pub mod resource_trait;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use capi::{CapiClusterView, Condition, ConditionStatus, ControlPlaneEndpoint};
pub use client::KubeResourceClient;
pub use error::ResourceError;
pub use kind::{build_apply_body, ResourceKind, CAPI_CLUSTER, NAMESPACE, SECRET};
pub use kube::api::DynamicObject;
pub use resource_trait::ResourceClientTrait;
#[cfg(any(test, feature = "test-util"))]
pub use mock::{MockResourceClient, ResourceCall};
