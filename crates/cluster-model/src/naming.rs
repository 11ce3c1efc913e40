//! Deterministic naming
//!
//! External tooling inspects clusters by these names, so the rules must be
//! reproduced exactly:
//!
//! - namespace: `magnum-{project id}` with the project id lower-cased and
//!   every non-alphanumeric character removed
//! - release / resource base name: the cluster name lower-cased with every
//!   run of non-alphanumeric characters collapsed to a single `-`
//! - suffixed names: `{base}-{suffix}`, sanitized as a whole
//! - identity credential: `{prefix}-{cluster uuid}`

use crate::cluster::Cluster;
use std::collections::BTreeMap;

/// Default namespace template.
pub const DEFAULT_NAMESPACE_TEMPLATE: &str = "magnum-{project_id}";

/// Label carrying the owning project id.
pub const PROJECT_ID_LABEL: &str = "magnum.openstack.org/project-id";

/// Label carrying the owning user id.
pub const USER_ID_LABEL: &str = "magnum.openstack.org/user-id";

/// Label carrying the cluster uuid; used for bulk cleanup.
pub const CLUSTER_UUID_LABEL: &str = "magnum.openstack.org/cluster-uuid";

/// Sanitizes a name, optionally suffixed, into an infrastructure identifier.
///
/// Lower-cases the input and replaces every run of characters outside
/// `[a-z0-9]` with a single `-`. Idempotent.
pub fn sanitized_name(name: &str, suffix: Option<&str>) -> String {
    let raw = match suffix {
        Some(suffix) => format!("{}-{}", name, suffix),
        None => name.to_string(),
    };

    let mut out = String::with_capacity(raw.len());
    let mut in_run = false;
    for c in raw.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('-');
            in_run = true;
        }
    }
    out
}

/// Renders the namespace a project's clusters live in.
pub fn namespace_for(template: &str, project_id: &str) -> String {
    let project_id: String = project_id
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect();
    template.replace("{project_id}", &project_id)
}

/// Name of the identity credential minted for a cluster.
pub fn credential_name(prefix: &str, cluster_uuid: &str) -> String {
    format!("{}-{}", prefix, cluster_uuid)
}

/// Labels stamped on every resource created for a cluster.
pub fn resource_labels(cluster: &Cluster) -> BTreeMap<String, String> {
    BTreeMap::from([
        (PROJECT_ID_LABEL.to_string(), cluster.project_id.clone()),
        (USER_ID_LABEL.to_string(), cluster.user_id.clone()),
        (CLUSTER_UUID_LABEL.to_string(), cluster.uuid.clone()),
    ])
}
