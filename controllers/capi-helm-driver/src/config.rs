//! Driver configuration
//!
//! Everything the driver needs is carried in [`DriverConfig`] and handed to
//! its constructor. `from_env` reads `MAGNUM_*` variables; `from_lookup`
//! takes any key lookup so tests do not have to touch the process
//! environment.

use crate::error::DriverError;
use cluster_model::DEFAULT_NAMESPACE_TEMPLATE;
use helm_client::HelmSettings;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_CHART_REPO: &str = "https://stackhpc.github.io/capi-helm-charts";
pub const DEFAULT_CHART_NAME: &str = "openstack-cluster";
pub const DEFAULT_CHART_VERSION: &str = "0.1.1-dev.0.main.39";
pub const DEFAULT_CREDENTIAL_PREFIX: &str = "magnum";
pub const DEFAULT_FIELD_MANAGER: &str = "magnum";
pub const DEFAULT_CLUSTER_STORE: &str = "/var/lib/magnum/clusters";

/// Configuration of the cluster driver
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub chart_repo: String,
    pub chart_name: String,
    pub chart_version: String,
    /// Namespace per project; `{project_id}` is replaced with the sanitized project id
    pub namespace_template: String,
    /// Prefix of the identity credential minted per cluster
    pub credential_prefix: String,
    /// Field manager used for server-side apply
    pub field_manager: String,
    /// Region written into generated cloud configuration
    pub region_name: Option<String>,
    /// Endpoint interface written into generated cloud configuration
    pub endpoint_interface: String,
    /// Whether workload clusters verify OpenStack TLS certificates
    pub verify_ca: bool,
    /// CA bundle handed to workload clusters; system trust store when unset
    pub ca_file: Option<PathBuf>,
    pub helm: HelmSettings,
    /// Time between status polls
    pub poll_interval: Duration,
    /// Clusters synced concurrently within one poll
    pub max_concurrent_syncs: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            chart_repo: DEFAULT_CHART_REPO.to_string(),
            chart_name: DEFAULT_CHART_NAME.to_string(),
            chart_version: DEFAULT_CHART_VERSION.to_string(),
            namespace_template: DEFAULT_NAMESPACE_TEMPLATE.to_string(),
            credential_prefix: DEFAULT_CREDENTIAL_PREFIX.to_string(),
            field_manager: DEFAULT_FIELD_MANAGER.to_string(),
            region_name: None,
            endpoint_interface: "public".to_string(),
            verify_ca: true,
            ca_file: None,
            helm: HelmSettings::default(),
            poll_interval: Duration::from_secs(60),
            max_concurrent_syncs: 8,
        }
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T, DriverError> {
    value
        .trim()
        .parse()
        .map_err(|_| DriverError::InvalidConfig(format!("{} has an invalid value: {}", key, value)))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, DriverError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(DriverError::InvalidConfig(format!("{} has an invalid value: {}", key, value))),
    }
}

impl DriverConfig {
    /// Load configuration from `MAGNUM_*` environment variables
    pub fn from_env() -> Result<Self, DriverError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup; unset keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DriverError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("MAGNUM_CHART_REPO") {
            config.chart_repo = v;
        }
        if let Some(v) = get("MAGNUM_CHART_NAME") {
            config.chart_name = v;
        }
        if let Some(v) = get("MAGNUM_CHART_VERSION") {
            config.chart_version = v;
        }
        if let Some(v) = get("MAGNUM_NAMESPACE_TEMPLATE") {
            if !v.contains("{project_id}") {
                return Err(DriverError::InvalidConfig(format!(
                    "MAGNUM_NAMESPACE_TEMPLATE must contain {{project_id}}: {}",
                    v
                )));
            }
            config.namespace_template = v;
        }
        if let Some(v) = get("MAGNUM_CREDENTIAL_PREFIX") {
            config.credential_prefix = v;
        }
        if let Some(v) = get("MAGNUM_FIELD_MANAGER") {
            config.field_manager = v;
        }
        config.region_name = get("MAGNUM_REGION_NAME");
        if let Some(v) = get("MAGNUM_ENDPOINT_INTERFACE") {
            // Accept the "publicURL" spelling too
            config.endpoint_interface = v.trim_end_matches("URL").to_string();
        }
        if let Some(v) = get("MAGNUM_VERIFY_CA") {
            config.verify_ca = parse_bool("MAGNUM_VERIFY_CA", &v)?;
        }
        config.ca_file = get("MAGNUM_CA_FILE").map(PathBuf::from);

        if let Some(v) = get("MAGNUM_HELM_EXECUTABLE") {
            config.helm.executable = v;
        }
        if let Some(v) = get("MAGNUM_HELM_TIMEOUT") {
            config.helm.default_timeout = v;
        }
        if let Some(v) = get("MAGNUM_HELM_HISTORY_MAX") {
            config.helm.history_max_revisions = parse("MAGNUM_HELM_HISTORY_MAX", &v)?;
        }
        if let Some(v) = get("MAGNUM_HELM_INSECURE_SKIP_TLS_VERIFY") {
            config.helm.insecure_skip_tls_verify = parse_bool("MAGNUM_HELM_INSECURE_SKIP_TLS_VERIFY", &v)?;
        }
        config.helm.kubeconfig = get("MAGNUM_KUBECONFIG").map(PathBuf::from);

        if let Some(v) = get("MAGNUM_POLL_INTERVAL_SECS") {
            let secs: u64 = parse("MAGNUM_POLL_INTERVAL_SECS", &v)?;
            if secs == 0 {
                return Err(DriverError::InvalidConfig("MAGNUM_POLL_INTERVAL_SECS must be positive".to_string()));
            }
            config.poll_interval = Duration::from_secs(secs);
        }
        if let Some(v) = get("MAGNUM_MAX_CONCURRENT_SYNCS") {
            config.max_concurrent_syncs = parse("MAGNUM_MAX_CONCURRENT_SYNCS", &v)?;
            if config.max_concurrent_syncs == 0 {
                return Err(DriverError::InvalidConfig("MAGNUM_MAX_CONCURRENT_SYNCS must be positive".to_string()));
            }
        }

        Ok(config)
    }
}

/// Endpoints and service credential for the OpenStack clients
#[derive(Clone)]
pub struct OpenStackSettings {
    /// Keystone v3 endpoint
    pub auth_url: String,
    /// Glance endpoint
    pub image_url: String,
    /// Barbican endpoint
    pub key_manager_url: String,
    pub application_credential_id: String,
    pub application_credential_secret: String,
}

impl std::fmt::Debug for OpenStackSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenStackSettings")
            .field("auth_url", &self.auth_url)
            .field("image_url", &self.image_url)
            .field("key_manager_url", &self.key_manager_url)
            .field("application_credential_id", &self.application_credential_id)
            .finish_non_exhaustive()
    }
}

impl OpenStackSettings {
    /// Load from `OS_*` environment variables
    pub fn from_env() -> Result<Self, DriverError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup; every key is required
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DriverError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| DriverError::InvalidConfig(format!("{} environment variable is required", key)))
        };

        Ok(Self {
            auth_url: require("OS_AUTH_URL")?,
            image_url: require("OS_IMAGE_URL")?,
            key_manager_url: require("OS_KEY_MANAGER_URL")?,
            application_credential_id: require("OS_APPLICATION_CREDENTIAL_ID")?,
            application_credential_secret: require("OS_APPLICATION_CREDENTIAL_SECRET")?,
        })
    }
}

/// Directory holding the cluster records, from `MAGNUM_CLUSTER_STORE`
pub fn cluster_store_dir<F>(lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    lookup("MAGNUM_CLUSTER_STORE")
        .filter(|v| !v.trim().is_empty())
        .map_or_else(|| PathBuf::from(DEFAULT_CLUSTER_STORE), PathBuf::from)
}
