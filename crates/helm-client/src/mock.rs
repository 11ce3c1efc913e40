//! Mock HelmClient for unit testing
//!
//! Keeps the merged values of every installed release in memory and records
//! each install and uninstall so tests can assert on them.

use crate::client::{InstallOptions, Release, ReleaseInfo, UninstallOptions};
use crate::error::HelmError;
use crate::helm_trait::HelmClientTrait;
use crate::values::merge_overlays;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// A recorded `install_or_upgrade` call
#[derive(Debug, Clone, PartialEq)]
pub struct InstallCall {
    pub release_name: String,
    pub chart_ref: String,
    /// Values after merging every overlay
    pub values: Value,
    pub options: InstallOptions,
}

/// A recorded `uninstall_release` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UninstallCall {
    pub release_name: String,
    pub options: UninstallOptions,
}

/// Mock HelmClient for testing
///
/// Releases are keyed by (namespace, name). Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockHelmClient {
    releases: Arc<Mutex<BTreeMap<(String, String), Release>>>,
    installs: Arc<Mutex<Vec<InstallCall>>>,
    uninstalls: Arc<Mutex<Vec<UninstallCall>>>,
    fail_with: Arc<Mutex<Option<String>>>,
}

impl MockHelmClient {
    /// Create a mock with no releases
    pub fn new() -> Self {
        Self::default()
    }

    /// Every install recorded so far
    pub fn installs(&self) -> Vec<InstallCall> {
        self.installs.lock().unwrap().clone()
    }

    /// Every uninstall recorded so far
    pub fn uninstalls(&self) -> Vec<UninstallCall> {
        self.uninstalls.lock().unwrap().clone()
    }

    /// Most recent merged values installed for a release
    pub fn last_values(&self, release_name: &str) -> Option<Value> {
        self.installs
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|call| call.release_name == release_name)
            .map(|call| call.values.clone())
    }

    /// Whether a release currently exists
    pub fn has_release(&self, namespace: &str, release_name: &str) -> bool {
        self.releases
            .lock()
            .unwrap()
            .contains_key(&(namespace.to_string(), release_name.to_string()))
    }

    /// Make every subsequent call fail as if helm exited with `stderr`
    pub fn fail_with(&self, stderr: impl Into<String>) {
        *self.fail_with.lock().unwrap() = Some(stderr.into());
    }

    /// Clear an injected failure
    pub fn clear_failure(&self) {
        *self.fail_with.lock().unwrap() = None;
    }

    fn check_failure(&self, command: &str) -> Result<(), HelmError> {
        match self.fail_with.lock().unwrap().clone() {
            Some(stderr) => Err(HelmError::CommandFailed {
                command: command.to_string(),
                code: Some(1),
                stderr,
            }),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl HelmClientTrait for MockHelmClient {
    async fn install_or_upgrade(
        &self,
        release_name: &str,
        chart_ref: &str,
        values: &[Value],
        options: &InstallOptions,
    ) -> Result<Release, HelmError> {
        self.check_failure("upgrade")?;

        self.installs.lock().unwrap().push(InstallCall {
            release_name: release_name.to_string(),
            chart_ref: chart_ref.to_string(),
            values: merge_overlays(values),
            options: options.clone(),
        });

        let namespace = options.namespace.clone().unwrap_or_else(|| "default".to_string());
        let mut releases = self.releases.lock().unwrap();
        let version = releases
            .get(&(namespace.clone(), release_name.to_string()))
            .map_or(1, |existing| existing.version + 1);
        let release = Release {
            name: release_name.to_string(),
            namespace: namespace.clone(),
            version,
            info: ReleaseInfo {
                status: "deployed".to_string(),
                description: String::from(if version == 1 { "Install complete" } else { "Upgrade complete" }),
            },
        };
        releases.insert((namespace, release_name.to_string()), release.clone());
        Ok(release)
    }

    async fn uninstall_release(
        &self,
        release_name: &str,
        options: &UninstallOptions,
    ) -> Result<(), HelmError> {
        self.check_failure("uninstall")?;

        self.uninstalls.lock().unwrap().push(UninstallCall {
            release_name: release_name.to_string(),
            options: options.clone(),
        });
        let namespace = options.namespace.clone().unwrap_or_else(|| "default".to_string());
        self.releases
            .lock()
            .unwrap()
            .remove(&(namespace, release_name.to_string()));
        Ok(())
    }
}
