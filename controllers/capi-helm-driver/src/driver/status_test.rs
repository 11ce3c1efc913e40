//! Unit tests for the status state machine

#[cfg(test)]
mod tests {
    use crate::driver::{ClusterDriver, SyncOutcome};
    use crate::error::DriverError;
    use crate::test_utils::{TestHarness, create_test_cluster, user_context};
    use cluster_model::{Cluster, ClusterStatus};
    use kube_resources::{CAPI_CLUSTER, ResourceCall, SECRET};
    use openstack_client::RequestContext;
    use serde_json::{Value, json};

    const NS: &str = "magnum-abc123";

    fn conditions(status: &str) -> Value {
        json!([
            {"type": "InfrastructureReady", "status": "True"},
            {"type": "ControlPlaneReady", "status": status},
            {"type": "Ready", "status": status},
        ])
    }

    fn seed_capi_cluster(h: &TestHarness, endpoint: Option<(&str, u16)>, ready: bool) {
        let mut data = json!({
            "spec": {},
            "status": {"conditions": conditions(if ready { "True" } else { "False" })},
        });
        if let Some((host, port)) = endpoint {
            data["spec"]["controlPlaneEndpoint"] = json!({"host": host, "port": port});
        }
        h.resources.insert(&CAPI_CLUSTER, "my-cluster", Some(NS), data);
    }

    /// Status pass as the poller runs it
    async fn sync(h: &TestHarness, cluster: &mut Cluster) -> Result<SyncOutcome, DriverError> {
        h.driver.update_cluster_status(&RequestContext::service(), cluster).await
    }

    async fn created(h: &TestHarness) -> Cluster {
        let cluster = create_test_cluster("my-cluster", "abc-123");
        h.driver.create_cluster(&user_context(), &cluster).await.unwrap();
        h.store.put(cluster.clone());
        cluster
    }

    #[tokio::test]
    async fn test_pending_while_capi_cluster_absent() {
        let h = TestHarness::new();
        let mut cluster = created(&h).await;

        let outcome = sync(&h, &mut cluster).await.unwrap();

        assert_eq!(outcome, SyncOutcome::Pending);
        assert_eq!(cluster.status, ClusterStatus::CreateInProgress);
        assert_eq!(h.store.saves(), 0);
    }

    #[tokio::test]
    async fn test_create_completes_when_ready() {
        let h = TestHarness::new();
        let mut cluster = created(&h).await;
        cluster.status_reason = Some("Creating".into());
        seed_capi_cluster(&h, Some(("10.0.0.5", 6443)), true);

        let outcome = sync(&h, &mut cluster).await.unwrap();

        assert_eq!(outcome, SyncOutcome::Completed(ClusterStatus::CreateComplete));
        assert_eq!(cluster.status, ClusterStatus::CreateComplete);
        assert_eq!(cluster.status_reason, None);
        assert_eq!(cluster.api_address.as_deref(), Some("https://10.0.0.5:6443"));

        let stored = h.store.get(&cluster.uuid).unwrap();
        assert_eq!(stored.status, ClusterStatus::CreateComplete);
        assert!(stored.updated_at.is_some());

        // Terminal states are left alone
        let saves = h.store.saves();
        let outcome = sync(&h, &mut cluster).await.unwrap();
        assert_eq!(outcome, SyncOutcome::Ignored);
        assert_eq!(h.store.saves(), saves);
    }

    #[tokio::test]
    async fn test_api_address_saved_before_ready() {
        let h = TestHarness::new();
        let mut cluster = created(&h).await;
        seed_capi_cluster(&h, Some(("10.0.0.5", 6443)), false);

        let outcome = sync(&h, &mut cluster).await.unwrap();

        assert_eq!(outcome, SyncOutcome::Pending);
        assert_eq!(cluster.status, ClusterStatus::CreateInProgress);
        let stored = h.store.get(&cluster.uuid).unwrap();
        assert_eq!(stored.api_address.as_deref(), Some("https://10.0.0.5:6443"));
        assert_eq!(h.store.saves(), 1);

        // Unchanged address is not saved again
        sync(&h, &mut cluster).await.unwrap();
        assert_eq!(h.store.saves(), 1);
    }

    #[tokio::test]
    async fn test_no_address_until_endpoint_published() {
        let h = TestHarness::new();
        let mut cluster = created(&h).await;
        seed_capi_cluster(&h, Some(("", 0)), false);

        let outcome = sync(&h, &mut cluster).await.unwrap();

        assert_eq!(outcome, SyncOutcome::Pending);
        assert_eq!(cluster.api_address, None);
        assert_eq!(h.store.saves(), 0);
    }

    #[tokio::test]
    async fn test_update_completes_when_ready() {
        let h = TestHarness::new();
        let mut cluster = created(&h).await;
        cluster.status = ClusterStatus::UpdateInProgress;
        cluster.api_address = Some("https://10.0.0.5:6443".into());
        seed_capi_cluster(&h, Some(("10.0.0.5", 6443)), true);

        let outcome = sync(&h, &mut cluster).await.unwrap();

        assert_eq!(outcome, SyncOutcome::Completed(ClusterStatus::UpdateComplete));
        // Only the terminal transition is saved
        assert_eq!(h.store.saves(), 1);
    }

    #[tokio::test]
    async fn test_delete_pending_while_capi_cluster_present() {
        let h = TestHarness::new();
        let mut cluster = created(&h).await;
        cluster.status = ClusterStatus::DeleteInProgress;
        seed_capi_cluster(&h, Some(("10.0.0.5", 6443)), true);
        h.driver.delete_cluster(&user_context(), &cluster).await.unwrap();

        let outcome = sync(&h, &mut cluster).await.unwrap();

        assert_eq!(outcome, SyncOutcome::Pending);
        assert_eq!(cluster.status, ClusterStatus::DeleteInProgress);
        assert_eq!(h.openstack.application_credentials().len(), 1);
        assert_eq!(h.resources.names(&SECRET, Some(NS)).len(), 5);
    }

    #[tokio::test]
    async fn test_delete_completes_and_deprovisions() {
        let h = TestHarness::new();
        let mut cluster = created(&h).await;
        cluster.status = ClusterStatus::DeleteInProgress;
        let credential_id = h.openstack.application_credentials()[0].id.clone();

        let outcome = sync(&h, &mut cluster).await.unwrap();

        assert_eq!(outcome, SyncOutcome::Completed(ClusterStatus::DeleteComplete));
        assert_eq!(h.store.get(&cluster.uuid).unwrap().status, ClusterStatus::DeleteComplete);
        assert!(h.resources.names(&SECRET, Some(NS)).is_empty());
        assert!(h.openstack.application_credentials().is_empty());
        assert_eq!(h.openstack.deleted_credentials(), vec![credential_id]);
        assert!(h.resources.calls().contains(&ResourceCall::DeleteAllByLabel {
            kind: "Secret".to_string(),
            selector: format!("magnum.openstack.org/cluster-uuid={}", cluster.uuid),
            namespace: Some(NS.to_string()),
        }));

        // A repeated pass finds nothing to do
        let outcome = sync(&h, &mut cluster).await.unwrap();
        assert_eq!(outcome, SyncOutcome::Ignored);
        assert_eq!(h.openstack.deleted_credentials().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_completes_when_credential_already_gone() {
        let h = TestHarness::new();
        let mut cluster = create_test_cluster("my-cluster", "abc-123");
        cluster.status = ClusterStatus::DeleteInProgress;
        h.store.put(cluster.clone());

        let outcome = sync(&h, &mut cluster).await.unwrap();

        assert_eq!(outcome, SyncOutcome::Completed(ClusterStatus::DeleteComplete));
        assert!(h.openstack.deleted_credentials().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_error_leaves_status_unchanged() {
        let h = TestHarness::new();
        let mut cluster = created(&h).await;
        h.resources.fail_fetches("connection refused");

        let err = sync(&h, &mut cluster).await.unwrap_err();

        assert!(matches!(err, DriverError::Resource(_)));
        assert!(err.is_retryable());
        assert_eq!(cluster.status, ClusterStatus::CreateInProgress);
        assert_eq!(h.store.saves(), 0);
    }

    #[tokio::test]
    async fn test_statuses_without_work_are_ignored() {
        let h = TestHarness::new();
        for status in [
            ClusterStatus::CreateFailed,
            ClusterStatus::UpdateComplete,
            ClusterStatus::DeleteFailed,
            ClusterStatus::RollbackInProgress,
        ] {
            let mut cluster = create_test_cluster("my-cluster", "abc-123");
            cluster.status = status;
            let outcome = sync(&h, &mut cluster).await.unwrap();
            assert_eq!(outcome, SyncOutcome::Ignored);
            assert_eq!(cluster.status, status);
        }
        assert!(h.resources.calls().is_empty());
    }
}
