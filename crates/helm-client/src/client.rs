//! Helm CLI client
//!
//! Builds helm command lines and runs them with `tokio::process`. Values go
//! in on stdin (`--values -`) and release information comes back as JSON
//! (`--output json`).

use crate::error::HelmError;
use crate::helm_trait::HelmClientTrait;
use crate::values::merge_overlays;
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Settings shared by every helm invocation
#[derive(Debug, Clone)]
pub struct HelmSettings {
    /// Path or name of the helm binary
    pub executable: String,
    /// Timeout used when an operation does not specify one
    pub default_timeout: String,
    /// Number of release revisions helm keeps
    pub history_max_revisions: u32,
    pub insecure_skip_tls_verify: bool,
    /// Kubeconfig to target; helm's own default when `None`
    pub kubeconfig: Option<PathBuf>,
}

impl Default for HelmSettings {
    fn default() -> Self {
        Self {
            executable: "helm".to_string(),
            default_timeout: "5m".to_string(),
            history_max_revisions: 10,
            insecure_skip_tls_verify: false,
            kubeconfig: None,
        }
    }
}

/// Options for `install_or_upgrade`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallOptions {
    pub namespace: Option<String>,
    /// Chart repository URL
    pub repo: Option<String>,
    /// Chart version
    pub version: Option<String>,
    /// Overrides the default timeout
    pub timeout: Option<String>,
    pub create_namespace: bool,
    pub dry_run: bool,
    pub force: bool,
    /// Wait for resources and jobs to become ready
    pub wait: bool,
}

/// Options for `uninstall_release`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UninstallOptions {
    pub namespace: Option<String>,
    /// Overrides the default timeout
    pub timeout: Option<String>,
    pub dry_run: bool,
    pub keep_history: bool,
    pub no_hooks: bool,
    pub wait: bool,
}

/// Release as reported by `helm upgrade --output json`
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Release {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    /// Revision number
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub info: ReleaseInfo,
}

/// `info` block of a release
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ReleaseInfo {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub description: String,
}

/// Helm client backed by the helm binary
#[derive(Debug, Clone, Default)]
pub struct HelmClient {
    settings: HelmSettings,
}

fn log_format(argument: &str) -> &str {
    if argument == "-" {
        "<stdin>"
    } else if argument.contains('\n') {
        "<multi-line string>"
    } else {
        argument
    }
}

impl HelmClient {
    /// Create a new helm client
    pub fn new(settings: HelmSettings) -> Self {
        Self { settings }
    }

    /// Settings in use
    pub fn settings(&self) -> &HelmSettings {
        &self.settings
    }

    /// Arguments for `helm upgrade --install`
    pub fn upgrade_args(&self, release_name: &str, chart_ref: &str, options: &InstallOptions) -> Vec<String> {
        let timeout = options
            .timeout
            .clone()
            .unwrap_or_else(|| self.settings.default_timeout.clone());

        let mut args: Vec<String> = vec![
            "upgrade".into(),
            release_name.into(),
            chart_ref.into(),
            "--history-max".into(),
            self.settings.history_max_revisions.to_string(),
            "--install".into(),
            "--output".into(),
            "json".into(),
            "--timeout".into(),
            timeout,
            // Values are sent on stdin
            "--values".into(),
            "-".into(),
        ];
        if options.create_namespace {
            args.push("--create-namespace".into());
        }
        if options.dry_run {
            args.push("--dry-run".into());
        }
        if options.force {
            args.push("--force".into());
        }
        if self.settings.insecure_skip_tls_verify {
            args.push("--insecure-skip-tls-verify".into());
        }
        if let Some(namespace) = &options.namespace {
            args.extend(["--namespace".into(), namespace.clone()]);
        }
        if let Some(repo) = &options.repo {
            args.extend(["--repo".into(), repo.clone()]);
        }
        if let Some(version) = &options.version {
            args.extend(["--version".into(), version.clone()]);
        }
        if options.wait {
            args.extend(["--wait".into(), "--wait-for-jobs".into()]);
        }
        self.push_kubeconfig(&mut args);
        args
    }

    /// Arguments for `helm uninstall`
    pub fn uninstall_args(&self, release_name: &str, options: &UninstallOptions) -> Vec<String> {
        let timeout = options
            .timeout
            .clone()
            .unwrap_or_else(|| self.settings.default_timeout.clone());

        let mut args: Vec<String> = vec![
            "uninstall".into(),
            release_name.into(),
            "--timeout".into(),
            timeout,
        ];
        if options.dry_run {
            args.push("--dry-run".into());
        }
        if options.keep_history {
            args.push("--keep-history".into());
        }
        if let Some(namespace) = &options.namespace {
            args.extend(["--namespace".into(), namespace.clone()]);
        }
        if options.no_hooks {
            args.push("--no-hooks".into());
        }
        if options.wait {
            args.push("--wait".into());
        }
        self.push_kubeconfig(&mut args);
        args
    }

    fn push_kubeconfig(&self, args: &mut Vec<String>) {
        if let Some(kubeconfig) = &self.settings.kubeconfig {
            args.extend(["--kubeconfig".into(), kubeconfig.display().to_string()]);
        }
    }

    /// Runs helm with `args`, feeding `input` on stdin, and returns stdout.
    async fn run(&self, args: &[String], input: Option<&[u8]>) -> Result<Vec<u8>, HelmError> {
        let printable: Vec<&str> = args.iter().map(|a| log_format(a)).collect();
        debug!("Running {} {}", self.settings.executable, printable.join(" "));

        let mut child = Command::new(&self.settings.executable)
            .args(args)
            .stdin(if input.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let (Some(input), Some(mut stdin)) = (input, child.stdin.take()) {
            stdin.write_all(input).await?;
            // Dropping stdin closes the pipe so helm sees EOF
            drop(stdin);
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(HelmError::CommandFailed {
                command: args.first().cloned().unwrap_or_default(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }
}

#[async_trait::async_trait]
impl HelmClientTrait for HelmClient {
    async fn install_or_upgrade(
        &self,
        release_name: &str,
        chart_ref: &str,
        values: &[Value],
        options: &InstallOptions,
    ) -> Result<Release, HelmError> {
        info!("Installing or upgrading release {} from chart {}", release_name, chart_ref);

        let args = self.upgrade_args(release_name, chart_ref, options);
        let input = serde_json::to_vec(&merge_overlays(values))?;
        let stdout = self.run(&args, Some(&input)).await?;
        let release: Release = serde_json::from_slice(&stdout)?;

        info!(
            "Release {} is at revision {} ({})",
            release.name, release.version, release.info.status
        );
        Ok(release)
    }

    async fn uninstall_release(
        &self,
        release_name: &str,
        options: &UninstallOptions,
    ) -> Result<(), HelmError> {
        info!("Uninstalling release {}", release_name);

        let args = self.uninstall_args(release_name, options);
        match self.run(&args, None).await {
            Ok(_) => Ok(()),
            // Already gone is the state we want
            Err(e) if e.is_release_not_found() => {
                warn!("Release {} not found, nothing to uninstall", release_name);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> HelmClient {
        HelmClient::new(HelmSettings::default())
    }

    #[test]
    fn test_upgrade_args_defaults() {
        let args = client().upgrade_args("my-cluster", "openstack-cluster", &InstallOptions::default());
        assert_eq!(
            args,
            vec![
                "upgrade", "my-cluster", "openstack-cluster", "--history-max", "10", "--install",
                "--output", "json", "--timeout", "5m", "--values", "-",
            ]
        );
    }

    #[test]
    fn test_upgrade_args_all_options() {
        let settings = HelmSettings {
            insecure_skip_tls_verify: true,
            kubeconfig: Some(PathBuf::from("/etc/magnum/kubeconfig")),
            history_max_revisions: 3,
            ..Default::default()
        };
        let options = InstallOptions {
            namespace: Some("magnum-abc123".into()),
            repo: Some("https://charts.example".into()),
            version: Some("0.1.0".into()),
            timeout: Some("10m".into()),
            create_namespace: true,
            dry_run: true,
            force: true,
            wait: true,
        };
        let args = HelmClient::new(settings).upgrade_args("r", "c", &options);
        let joined = args.join(" ");

        assert!(joined.starts_with("upgrade r c --history-max 3 --install --output json --timeout 10m --values -"));
        for expected in [
            "--create-namespace",
            "--dry-run",
            "--force",
            "--insecure-skip-tls-verify",
            "--namespace magnum-abc123",
            "--repo https://charts.example",
            "--version 0.1.0",
            "--wait --wait-for-jobs",
        ] {
            assert!(joined.contains(expected), "missing {expected} in {joined}");
        }
        assert!(joined.ends_with("--kubeconfig /etc/magnum/kubeconfig"));
    }

    #[test]
    fn test_uninstall_args() {
        let options = UninstallOptions {
            namespace: Some("magnum-abc123".into()),
            keep_history: true,
            no_hooks: true,
            wait: true,
            ..Default::default()
        };
        let args = client().uninstall_args("my-cluster", &options);
        assert_eq!(
            args,
            vec![
                "uninstall", "my-cluster", "--timeout", "5m", "--keep-history", "--namespace",
                "magnum-abc123", "--no-hooks", "--wait",
            ]
        );
    }

    #[test]
    fn test_log_format_hides_stdin_and_documents() {
        assert_eq!(log_format("-"), "<stdin>");
        assert_eq!(log_format("a\nb"), "<multi-line string>");
        assert_eq!(log_format("--install"), "--install");
    }

    #[test]
    fn test_release_from_helm_output() {
        let output = r#"{
            "name": "my-cluster",
            "info": {"first_deployed": "2024-01-01T00:00:00Z", "status": "deployed", "description": "Install complete"},
            "chart": {"metadata": {"name": "openstack-cluster"}},
            "config": {"kubernetesVersion": "1.28.0"},
            "manifest": "---\n",
            "version": 2,
            "namespace": "magnum-abc123"
        }"#;
        let release: Release = serde_json::from_str(output).unwrap();
        assert_eq!(release.name, "my-cluster");
        assert_eq!(release.version, 2);
        assert_eq!(release.namespace, "magnum-abc123");
        assert_eq!(release.info.status, "deployed");
    }

    #[test]
    fn test_release_not_found_detection() {
        let not_found = HelmError::CommandFailed {
            command: "uninstall".into(),
            code: Some(1),
            stderr: "Error: uninstall: Release not loaded: my-cluster: release: not found".into(),
        };
        assert!(not_found.is_release_not_found());

        let other = HelmError::CommandFailed {
            command: "uninstall".into(),
            code: Some(1),
            stderr: "Error: Kubernetes cluster unreachable".into(),
        };
        assert!(!other.is_release_not_found());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_missing_executable_is_io_error() {
        let client = HelmClient::new(HelmSettings {
            executable: "/nonexistent/helm".into(),
            ..Default::default()
        });
        let result = client.uninstall_release("x", &UninstallOptions::default()).await;
        assert!(matches!(result, Err(HelmError::Io(_))));
    }

    /// A stand-in helm binary in its own scratch directory.
    ///
    /// The script records its argv and stdin, then runs `body`.
    #[cfg(unix)]
    struct FakeHelm {
        dir: PathBuf,
    }

    #[cfg(unix)]
    impl FakeHelm {
        fn new(body: &str) -> Self {
            use std::os::unix::fs::PermissionsExt;

            let dir = std::env::temp_dir().join(format!("helm-client-fake-{}", uuid::Uuid::new_v4()));
            std::fs::create_dir_all(&dir).unwrap();
            let script = format!(
                "#!/bin/sh\nprintf '%s' \"$*\" > '{dir}/argv'\ncat > '{dir}/stdin'\n{body}\n",
                dir = dir.display(),
            );
            let path = dir.join("helm");
            std::fs::write(&path, script).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            Self { dir }
        }

        fn client(&self) -> HelmClient {
            HelmClient::new(HelmSettings {
                executable: self.dir.join("helm").display().to_string(),
                ..Default::default()
            })
        }

        fn argv(&self) -> String {
            std::fs::read_to_string(self.dir.join("argv")).unwrap()
        }

        fn stdin(&self) -> String {
            std::fs::read_to_string(self.dir.join("stdin")).unwrap()
        }
    }

    #[cfg(unix)]
    impl Drop for FakeHelm {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.dir);
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_install_sends_merged_values_on_stdin() {
        let helm = FakeHelm::new(
            r#"printf '%s' '{"name":"r","namespace":"magnum-abc123","version":3,"info":{"status":"deployed"}}'"#,
        );
        let overlays = [
            serde_json::json!({"a": [1], "s": "secret", "nested": {"x": 1}}),
            serde_json::json!({"a": [2], "nested": {"y": 2}}),
        ];

        let release = helm
            .client()
            .install_or_upgrade("r", "c", &overlays, &InstallOptions::default())
            .await
            .unwrap();

        assert_eq!(release.name, "r");
        assert_eq!(release.version, 3);
        assert_eq!(release.info.status, "deployed");
        assert_eq!(
            helm.argv(),
            "upgrade r c --history-max 10 --install --output json --timeout 5m --values -"
        );
        let stdin: Value = serde_json::from_str(&helm.stdin()).unwrap();
        assert_eq!(
            stdin,
            serde_json::json!({"a": [1, 2], "s": "secret", "nested": {"x": 1, "y": 2}})
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_uninstall_of_missing_release_succeeds() {
        let helm = FakeHelm::new(
            "echo 'Error: uninstall: Release not loaded: r: release: not found' >&2\nexit 1",
        );

        let options = UninstallOptions {
            namespace: Some("magnum-abc123".into()),
            ..Default::default()
        };
        helm.client().uninstall_release("r", &options).await.unwrap();

        assert_eq!(helm.argv(), "uninstall r --timeout 5m --namespace magnum-abc123");
        assert_eq!(helm.stdin(), "");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_uninstall_failure_is_reported() {
        let helm = FakeHelm::new("echo 'Error: Kubernetes cluster unreachable' >&2\nexit 1");

        let err = helm
            .client()
            .uninstall_release("r", &UninstallOptions::default())
            .await
            .unwrap_err();

        match err {
            HelmError::CommandFailed { command, code, stderr } => {
                assert_eq!(command, "uninstall");
                assert_eq!(code, Some(1));
                assert_eq!(stderr, "Error: Kubernetes cluster unreachable");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unparseable_release_output() {
        let helm = FakeHelm::new("echo 'Release \"r\" has been upgraded.'");

        let result = helm
            .client()
            .install_or_upgrade("r", "c", &[], &InstallOptions::default())
            .await;
        assert!(matches!(result, Err(HelmError::Serialization(_))));
        assert_eq!(helm.stdin(), "{}");
    }
}
