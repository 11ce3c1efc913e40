//! Cluster record
//!
//! The declared shape of a cluster as stored by the API layer. The driver
//! treats everything here as read-only except `status`, `status_reason`,
//! `api_address` and `updated_at`.

use crate::status::ClusterStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Node group role reserved for control-plane machines.
pub const MASTER_ROLE: &str = "master";

/// A cluster record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cluster {
    /// Unique id, used to name the identity credential and to label resources
    pub uuid: String,

    /// Human readable name; sanitized before use as an infrastructure identifier
    pub name: String,

    /// Owning project
    pub project_id: String,

    /// Owning user
    pub user_id: String,

    /// Lifecycle status
    pub status: ClusterStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_reason: Option<String>,

    /// Kubernetes API address, once the control plane endpoint is known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_address: Option<String>,

    /// Control plane machine flavor
    pub master_flavor_id: String,

    /// Number of control plane machines
    pub master_count: u32,

    /// Whether the API server sits behind a load balancer
    #[serde(default)]
    pub master_lb_enabled: bool,

    /// SSH key pair name injected into machines
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keypair: Option<String>,

    /// Instance label overrides, consulted before the template labels
    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    /// Node groups, unique by name
    #[serde(default)]
    pub nodegroups: Vec<NodeGroup>,

    /// Template this cluster was created from
    pub cluster_template: ClusterTemplate,

    /// Certificate service reference for the cluster CA
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert_ref: Option<String>,

    /// Certificate service reference for the etcd CA
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etcd_ca_cert_ref: Option<String>,

    /// Certificate service reference for the front proxy CA
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub front_proxy_ca_cert_ref: Option<String>,

    /// Certificate service reference for the service account signing cert
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnum_cert_ref: Option<String>,

    /// Last time the record was saved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Cluster {
    /// Looks up a label on the cluster, then on `template`, then falls back to `default`.
    ///
    /// `template` is usually `self.cluster_template`; an upgrade passes the target template.
    pub fn label<'a>(&'a self, template: &'a ClusterTemplate, key: &str, default: &'a str) -> &'a str {
        self.labels
            .get(key)
            .or_else(|| template.labels.get(key))
            .map_or(default, String::as_str)
    }

    /// Node groups that run workloads (every group whose role is not "master").
    pub fn worker_nodegroups(&self) -> impl Iterator<Item = &NodeGroup> {
        self.nodegroups.iter().filter(|ng| !ng.is_master())
    }

    /// Certificate service reference for the given certificate kind.
    pub fn certificate_ref(&self, kind: CertificateKind) -> Option<&str> {
        match kind {
            CertificateKind::Ca => self.ca_cert_ref.as_deref(),
            CertificateKind::Etcd => self.etcd_ca_cert_ref.as_deref(),
            CertificateKind::FrontProxy => self.front_proxy_ca_cert_ref.as_deref(),
            CertificateKind::ServiceAccount => self.magnum_cert_ref.as_deref(),
        }
    }
}

/// A cluster template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ClusterTemplate {
    #[serde(default)]
    pub uuid: String,

    #[serde(default)]
    pub name: String,

    /// Image name or id, resolved through the image service
    pub image_id: String,

    /// Default labels (e.g. `kube_tag`, `fixed_subnet_cidr`)
    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    /// Comma separated DNS servers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_nameserver: Option<String>,
}

/// A named pool of machines within a cluster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeGroup {
    pub name: String,
    pub flavor_id: String,
    pub node_count: u32,
    pub role: String,
}

impl NodeGroup {
    /// True for control plane node groups.
    pub fn is_master(&self) -> bool {
        self.role == MASTER_ROLE
    }
}

/// A cluster federation. Only consumed by operations the driver rejects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Federation {
    pub uuid: String,
    pub name: String,
}

/// The certificate material copied into the cluster namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CertificateKind {
    /// Cluster root CA
    Ca,
    /// etcd CA
    Etcd,
    /// Front proxy CA
    FrontProxy,
    /// Service account signing certificate
    ServiceAccount,
}

impl CertificateKind {
    /// Every kind, in the order secrets are written.
    pub const ALL: [CertificateKind; 4] = [
        CertificateKind::Ca,
        CertificateKind::Etcd,
        CertificateKind::FrontProxy,
        CertificateKind::ServiceAccount,
    ];

    /// Suffix appended to the sanitized cluster name to name the secret.
    pub fn secret_suffix(&self) -> &'static str {
        match self {
            CertificateKind::Ca => "ca",
            CertificateKind::Etcd => "etcd",
            CertificateKind::FrontProxy => "proxy",
            CertificateKind::ServiceAccount => "sa",
        }
    }
}
