//! Helm values for the `openstack-cluster` chart

use crate::error::DriverError;
use cluster_model::{Cluster, ClusterTemplate, sanitized_name};
use serde_json::{Value, json};

/// Template label holding the Kubernetes version (e.g. `v1.28.0`)
pub const KUBE_TAG_LABEL: &str = "kube_tag";

/// Label holding the node network CIDR
pub const FIXED_SUBNET_CIDR_LABEL: &str = "fixed_subnet_cidr";

pub const DEFAULT_NODE_CIDR: &str = "10.0.0.0/24";

/// Suffix of the secret holding the cloud credentials
pub const CLOUD_CREDENTIALS_SUFFIX: &str = "cloud-credentials";

/// Builds the chart values for a cluster.
///
/// Template-level settings come from `template` alone, never from the
/// cluster's own embedded template. `image_id` is the already resolved
/// machine image.
pub fn assemble(cluster: &Cluster, template: &ClusterTemplate, image_id: &str) -> Result<Value, DriverError> {
    let kube_tag = template.labels.get(KUBE_TAG_LABEL).ok_or_else(|| {
        DriverError::InvalidConfig(format!(
            "cluster template {} has no {} label",
            template.uuid, KUBE_TAG_LABEL
        ))
    })?;

    let node_groups: Vec<Value> = cluster
        .worker_nodegroups()
        .map(|ng| {
            json!({
                "name": sanitized_name(&ng.name, None),
                "machineFlavor": ng.flavor_id,
                "machineCount": ng.node_count,
            })
        })
        .collect();

    let mut values = json!({
        "kubernetesVersion": kube_tag.trim_start_matches('v'),
        "machineImageId": image_id,
        "cloudCredentialsSecretName": sanitized_name(&cluster.name, Some(CLOUD_CREDENTIALS_SUFFIX)),
        "clusterNetworking": {
            "internalNetwork": {
                "nodeCidr": cluster.label(template, FIXED_SUBNET_CIDR_LABEL, DEFAULT_NODE_CIDR),
            }
        },
        "apiServer": {"enableLoadBalancer": cluster.master_lb_enabled},
        "controlPlane": {
            "machineFlavor": cluster.master_flavor_id,
            "machineCount": cluster.master_count,
        },
        "nodeGroups": node_groups,
    });

    if let Some(dns) = template.dns_nameserver.as_deref().filter(|d| !d.is_empty()) {
        let servers: Vec<&str> = dns.split(',').collect();
        values["clusterNetworking"]["dnsNameservers"] = json!(servers);
    }
    if let Some(keypair) = &cluster.keypair {
        values["machineSSHKeyName"] = json!(keypair);
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_cluster;
    use cluster_model::NodeGroup;

    #[test]
    fn test_example_cluster() {
        let cluster = create_test_cluster("my-cluster", "abc-123");
        let values = assemble(&cluster, &cluster.cluster_template, "image-uuid").unwrap();

        assert_eq!(
            values,
            json!({
                "kubernetesVersion": "1.28.0",
                "machineImageId": "image-uuid",
                "cloudCredentialsSecretName": "my-cluster-cloud-credentials",
                "clusterNetworking": {"internalNetwork": {"nodeCidr": "10.0.0.0/24"}},
                "apiServer": {"enableLoadBalancer": false},
                "controlPlane": {"machineFlavor": "m1.medium", "machineCount": 1},
                "nodeGroups": [{"name": "workers", "machineFlavor": "m1.small", "machineCount": 3}],
            })
        );
    }

    #[test]
    fn test_optional_values() {
        let mut cluster = create_test_cluster("My Cluster", "abc-123");
        cluster.keypair = Some("ops-key".into());
        cluster.master_lb_enabled = true;
        cluster.labels.insert(FIXED_SUBNET_CIDR_LABEL.into(), "192.168.10.0/24".into());
        cluster.cluster_template.dns_nameserver = Some("8.8.8.8,1.1.1.1".into());
        cluster.nodegroups.push(NodeGroup {
            name: "GPU Nodes".into(),
            flavor_id: "g1.large".into(),
            node_count: 2,
            role: "worker".into(),
        });

        let values = assemble(&cluster, &cluster.cluster_template, "image-uuid").unwrap();
        assert_eq!(values["machineSSHKeyName"], "ops-key");
        assert_eq!(values["apiServer"]["enableLoadBalancer"], true);
        assert_eq!(values["cloudCredentialsSecretName"], "my-cluster-cloud-credentials");
        assert_eq!(values["clusterNetworking"]["internalNetwork"]["nodeCidr"], "192.168.10.0/24");
        assert_eq!(values["clusterNetworking"]["dnsNameservers"], json!(["8.8.8.8", "1.1.1.1"]));
        assert_eq!(values["nodeGroups"][1]["name"], "gpu-nodes");
    }

    #[test]
    fn test_master_groups_excluded() {
        let mut cluster = create_test_cluster("my-cluster", "abc-123");
        cluster.nodegroups.insert(
            0,
            NodeGroup {
                name: "default-master".into(),
                flavor_id: "m1.medium".into(),
                node_count: 1,
                role: "master".into(),
            },
        );
        let values = assemble(&cluster, &cluster.cluster_template, "image-uuid").unwrap();
        assert_eq!(values["nodeGroups"].as_array().map(Vec::len), Some(1));
        assert_eq!(values["nodeGroups"][0]["name"], "workers");
    }

    #[test]
    fn test_missing_kube_tag() {
        let mut cluster = create_test_cluster("my-cluster", "abc-123");
        cluster.cluster_template.labels.remove(KUBE_TAG_LABEL);
        let result = assemble(&cluster, &cluster.cluster_template, "image-uuid");
        assert!(matches!(result, Err(DriverError::InvalidConfig(_))));
    }

    #[test]
    fn test_values_follow_given_template() {
        let mut cluster = create_test_cluster("my-cluster", "abc-123");
        cluster
            .cluster_template
            .labels
            .insert(FIXED_SUBNET_CIDR_LABEL.into(), "192.168.10.0/24".into());

        let mut target = cluster.cluster_template.clone();
        target.labels.insert(KUBE_TAG_LABEL.into(), "v1.29.1".into());
        target.labels.insert(FIXED_SUBNET_CIDR_LABEL.into(), "172.16.0.0/24".into());
        target.dns_nameserver = Some("9.9.9.9".into());

        let values = assemble(&cluster, &target, "image-uuid").unwrap();
        assert_eq!(values["kubernetesVersion"], "1.29.1");
        assert_eq!(values["clusterNetworking"]["internalNetwork"]["nodeCidr"], "172.16.0.0/24");
        assert_eq!(values["clusterNetworking"]["dnsNameservers"], json!(["9.9.9.9"]));

        // Falls back to the default, not to the cluster's embedded template
        target.labels.remove(FIXED_SUBNET_CIDR_LABEL);
        let values = assemble(&cluster, &target, "image-uuid").unwrap();
        assert_eq!(values["clusterNetworking"]["internalNetwork"]["nodeCidr"], DEFAULT_NODE_CIDR);
    }

    #[test]
    fn test_kube_tag_without_prefix() {
        let mut cluster = create_test_cluster("my-cluster", "abc-123");
        cluster.cluster_template.labels.insert(KUBE_TAG_LABEL.into(), "1.27.4".into());
        let values = assemble(&cluster, &cluster.cluster_template, "image-uuid").unwrap();
        assert_eq!(values["kubernetesVersion"], "1.27.4");
    }
}
