//! Mock ResourceClient for unit testing
//!
//! Stores objects in memory, keyed by (kind, namespace, name), and records
//! every call so tests can assert on what the driver did.

use crate::error::ResourceError;
use crate::kind::{build_apply_body, ResourceKind};
use crate::resource_trait::ResourceClientTrait;
use kube::api::DynamicObject;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

type ObjectKey = (String, String, String);

/// One recorded call against the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceCall {
    Fetch { kind: String, name: String, namespace: Option<String> },
    Apply { kind: String, name: String, namespace: Option<String> },
    Delete { kind: String, name: String, namespace: Option<String> },
    DeleteAllByLabel { kind: String, selector: String, namespace: Option<String> },
}

/// Mock ResourceClient for testing
///
/// Clones share the same store, so a test can keep one handle while the
/// driver owns another.
#[derive(Clone, Default)]
pub struct MockResourceClient {
    objects: Arc<Mutex<BTreeMap<ObjectKey, DynamicObject>>>,
    calls: Arc<Mutex<Vec<ResourceCall>>>,
    fail_fetch: Arc<Mutex<Option<String>>>,
}

fn key(kind: &ResourceKind, name: &str, namespace: Option<&str>) -> ObjectKey {
    (
        kind.kind.to_string(),
        namespace.unwrap_or_default().to_string(),
        name.to_string(),
    )
}

impl MockResourceClient {
    /// Create an empty mock
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object (for test setup). `data` holds top-level fields such as `spec` and `status`.
    pub fn insert(&self, kind: &ResourceKind, name: &str, namespace: Option<&str>, data: Value) {
        let body = build_apply_body(kind, name, namespace, data).unwrap();
        let object: DynamicObject = serde_json::from_value(body).unwrap();
        self.objects
            .lock()
            .unwrap()
            .insert(key(kind, name, namespace), object);
    }

    /// Remove an object without recording a call (simulates an external controller)
    pub fn remove(&self, kind: &ResourceKind, name: &str, namespace: Option<&str>) {
        self.objects.lock().unwrap().remove(&key(kind, name, namespace));
    }

    /// Look at a stored object without recording a call
    pub fn get(&self, kind: &ResourceKind, name: &str, namespace: Option<&str>) -> Option<DynamicObject> {
        self.objects
            .lock()
            .unwrap()
            .get(&key(kind, name, namespace))
            .cloned()
    }

    /// Names of stored objects of a kind in a namespace
    pub fn names(&self, kind: &ResourceKind, namespace: Option<&str>) -> Vec<String> {
        let namespace = namespace.unwrap_or_default();
        self.objects
            .lock()
            .unwrap()
            .keys()
            .filter(|(k, ns, _)| k == kind.kind.as_ref() && ns == namespace)
            .map(|(_, _, name)| name.clone())
            .collect()
    }

    /// Make every subsequent fetch fail with an API error carrying `message`
    pub fn fail_fetches(&self, message: impl Into<String>) {
        *self.fail_fetch.lock().unwrap() = Some(message.into());
    }

    /// Every call made so far
    pub fn calls(&self) -> Vec<ResourceCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: ResourceCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait::async_trait]
impl ResourceClientTrait for MockResourceClient {
    async fn fetch(
        &self,
        kind: &ResourceKind,
        name: &str,
        namespace: Option<&str>,
    ) -> Result<Option<DynamicObject>, ResourceError> {
        kind.assert_scope(namespace);
        self.record(ResourceCall::Fetch {
            kind: kind.kind.to_string(),
            name: name.to_string(),
            namespace: namespace.map(str::to_string),
        });

        if let Some(message) = self.fail_fetch.lock().unwrap().clone() {
            return Err(ResourceError::Malformed(message));
        }
        Ok(self.get(kind, name, namespace))
    }

    async fn apply(
        &self,
        kind: &ResourceKind,
        name: &str,
        body: Value,
        namespace: Option<&str>,
    ) -> Result<DynamicObject, ResourceError> {
        kind.assert_scope(namespace);
        self.record(ResourceCall::Apply {
            kind: kind.kind.to_string(),
            name: name.to_string(),
            namespace: namespace.map(str::to_string),
        });

        let body = build_apply_body(kind, name, namespace, body)?;
        let object: DynamicObject = serde_json::from_value(body)?;
        self.objects
            .lock()
            .unwrap()
            .insert(key(kind, name, namespace), object.clone());
        Ok(object)
    }

    async fn delete(
        &self,
        kind: &ResourceKind,
        name: &str,
        namespace: Option<&str>,
    ) -> Result<(), ResourceError> {
        kind.assert_scope(namespace);
        self.record(ResourceCall::Delete {
            kind: kind.kind.to_string(),
            name: name.to_string(),
            namespace: namespace.map(str::to_string),
        });

        self.objects.lock().unwrap().remove(&key(kind, name, namespace));
        Ok(())
    }

    async fn delete_all_by_label(
        &self,
        kind: &ResourceKind,
        label: &str,
        value: &str,
        namespace: Option<&str>,
    ) -> Result<(), ResourceError> {
        kind.assert_scope(namespace);
        self.record(ResourceCall::DeleteAllByLabel {
            kind: kind.kind.to_string(),
            selector: format!("{}={}", label, value),
            namespace: namespace.map(str::to_string),
        });

        let namespace = namespace.unwrap_or_default();
        self.objects.lock().unwrap().retain(|(k, ns, _), object| {
            let matches = k == kind.kind.as_ref()
                && ns == namespace
                && object
                    .metadata
                    .labels
                    .as_ref()
                    .and_then(|labels| labels.get(label))
                    .is_some_and(|v| v == value);
            !matches
        });
        Ok(())
    }
}
