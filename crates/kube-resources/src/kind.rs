//! Resource kind descriptors

use crate::error::ResourceError;
use kube::discovery::ApiResource;
use serde_json::{Map, Value};
use std::borrow::Cow;

/// Describes one kind of resource on the Kubernetes API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceKind {
    /// `group/version`, or just `version` for the core group
    pub api_version: Cow<'static, str>,
    pub kind: Cow<'static, str>,
    pub plural: Cow<'static, str>,
    /// Whether objects of this kind live inside a namespace
    pub namespaced: bool,
}

/// Core `Namespace` (cluster-scoped).
pub const NAMESPACE: ResourceKind = ResourceKind {
    api_version: Cow::Borrowed("v1"),
    kind: Cow::Borrowed("Namespace"),
    plural: Cow::Borrowed("namespaces"),
    namespaced: false,
};

/// Core `Secret` (namespaced).
pub const SECRET: ResourceKind = ResourceKind {
    api_version: Cow::Borrowed("v1"),
    kind: Cow::Borrowed("Secret"),
    plural: Cow::Borrowed("secrets"),
    namespaced: true,
};

/// Cluster API `Cluster` (namespaced).
pub const CAPI_CLUSTER: ResourceKind = ResourceKind {
    api_version: Cow::Borrowed("cluster.x-k8s.io/v1beta1"),
    kind: Cow::Borrowed("Cluster"),
    plural: Cow::Borrowed("clusters"),
    namespaced: true,
};

impl ResourceKind {
    /// Describes a kind whose plural is the lower-cased kind followed by `s`.
    pub fn new(api_version: impl Into<String>, kind: impl Into<String>, namespaced: bool) -> Self {
        let kind = kind.into();
        let plural = format!("{}s", kind.to_lowercase());
        Self {
            api_version: Cow::Owned(api_version.into()),
            kind: Cow::Owned(kind),
            plural: Cow::Owned(plural),
            namespaced,
        }
    }

    /// Overrides the plural name.
    pub fn with_plural(mut self, plural: impl Into<String>) -> Self {
        self.plural = Cow::Owned(plural.into());
        self
    }

    /// Splits the API version into (group, version); the core group is "".
    pub fn group_version(&self) -> (&str, &str) {
        match self.api_version.rfind('/') {
            Some(idx) => (&self.api_version[..idx], &self.api_version[idx + 1..]),
            None => ("", &self.api_version),
        }
    }

    /// Converts into the descriptor `kube::Api<DynamicObject>` expects.
    pub fn api_resource(&self) -> ApiResource {
        let (group, version) = self.group_version();
        ApiResource {
            group: group.to_string(),
            version: version.to_string(),
            api_version: self.api_version.to_string(),
            kind: self.kind.to_string(),
            plural: self.plural.to_string(),
        }
    }

    /// REST path of an object (or of the collection when `name` is `None`).
    pub fn path(&self, name: Option<&str>, namespace: Option<&str>) -> String {
        let prefix = if self.api_version.contains('/') { "/apis" } else { "/api" };
        let namespace = namespace.map(|ns| format!("/namespaces/{}", ns)).unwrap_or_default();
        let name = name.map(|n| format!("/{}", n)).unwrap_or_default();
        format!("{}/{}{}/{}{}", prefix, self.api_version, namespace, self.plural, name)
    }

    /// Panics unless a namespace is given exactly when the kind is namespaced.
    ///
    /// A mismatch is a programming error in the caller, never a runtime
    /// condition to recover from.
    pub fn assert_scope(&self, namespace: Option<&str>) {
        let has_namespace = namespace.is_some_and(|ns| !ns.is_empty());
        assert!(
            self.namespaced == has_namespace,
            "{} {} namespaced, but namespace was {:?}",
            self.kind,
            if self.namespaced { "is" } else { "is not" },
            namespace
        );
    }
}

/// Builds the body sent for a server-side apply.
///
/// Sets `apiVersion`, `kind`, `metadata.name` and (when given)
/// `metadata.namespace` on a copy of `body`. A `null` body is treated as `{}`.
pub fn build_apply_body(
    kind: &ResourceKind,
    name: &str,
    namespace: Option<&str>,
    body: Value,
) -> Result<Value, ResourceError> {
    let mut object = match body {
        Value::Null => Map::new(),
        Value::Object(map) => map,
        other => {
            return Err(ResourceError::Malformed(format!(
                "apply body for {} {} must be an object, got {}",
                kind.kind, name, other
            )));
        }
    };

    object.insert("apiVersion".to_string(), Value::String(kind.api_version.to_string()));
    object.insert("kind".to_string(), Value::String(kind.kind.to_string()));

    let metadata = object
        .entry("metadata")
        .or_insert_with(|| Value::Object(Map::new()));
    let Value::Object(metadata) = metadata else {
        return Err(ResourceError::Malformed(format!(
            "metadata for {} {} must be an object",
            kind.kind, name
        )));
    };
    metadata.insert("name".to_string(), Value::String(name.to_string()));
    if let Some(namespace) = namespace {
        metadata.insert("namespace".to_string(), Value::String(namespace.to_string()));
    }

    Ok(Value::Object(object))
}
