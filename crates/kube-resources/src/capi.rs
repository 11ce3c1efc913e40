//! Typed view of a Cluster API `Cluster`
//!
//! The driver only reads two things from the object: the control plane
//! endpoint and the status conditions. Everything else stays untyped in
//! the underlying `DynamicObject`.

use crate::error::ResourceError;
use kube::api::DynamicObject;
use serde::Deserialize;

/// Conditions that must all be `True` before a cluster counts as converged.
pub const READY_CONDITIONS: [&str; 3] = ["InfrastructureReady", "ControlPlaneReady", "Ready"];

/// `spec.controlPlaneEndpoint`
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ControlPlaneEndpoint {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: u16,
}

impl ControlPlaneEndpoint {
    /// URL of the Kubernetes API
    pub fn api_address(&self) -> String {
        format!("https://{}:{}", self.host, self.port)
    }
}

/// Condition status as reported by the API server
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub enum ConditionStatus {
    True,
    False,
    #[serde(other)]
    Unknown,
}

/// One entry of `status.conditions`
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: ConditionStatus,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Read-only view of the fields the driver consumes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapiClusterView {
    /// `None` until the infrastructure provider has published an endpoint
    pub control_plane_endpoint: Option<ControlPlaneEndpoint>,
    pub conditions: Vec<Condition>,
}

impl CapiClusterView {
    /// Extracts the view from a fetched object.
    ///
    /// An endpoint with an empty host is treated as not yet published.
    pub fn from_object(object: &DynamicObject) -> Result<Self, ResourceError> {
        let endpoint = match object.data.pointer("/spec/controlPlaneEndpoint") {
            Some(value) if !value.is_null() => {
                let endpoint: ControlPlaneEndpoint = serde_json::from_value(value.clone())?;
                (!endpoint.host.is_empty()).then_some(endpoint)
            }
            _ => None,
        };

        let conditions = match object.data.pointer("/status/conditions") {
            Some(value) if !value.is_null() => serde_json::from_value(value.clone())?,
            _ => Vec::new(),
        };

        Ok(Self {
            control_plane_endpoint: endpoint,
            conditions,
        })
    }

    /// Status of the named condition, if reported.
    pub fn condition(&self, type_: &str) -> Option<ConditionStatus> {
        self.conditions
            .iter()
            .find(|c| c.type_ == type_)
            .map(|c| c.status)
    }

    /// True when every named condition is reported with status `True`.
    pub fn all_true(&self, types: &[&str]) -> bool {
        types
            .iter()
            .all(|t| self.condition(t) == Some(ConditionStatus::True))
    }

    /// True when the cluster has converged.
    pub fn is_ready(&self) -> bool {
        self.all_true(&READY_CONDITIONS)
    }

    /// API address derived from the control plane endpoint, if published.
    pub fn api_address(&self) -> Option<String> {
        self.control_plane_endpoint.as_ref().map(ControlPlaneEndpoint::api_address)
    }
}
