//! Workload cluster credentials
//!
//! Provisioning mints an application credential for the cluster owner,
//! acting as the requesting user, and writes it with the CA bundle into a
//! `clouds.yaml` secret. The cluster's
//! certificate authorities are copied in as TLS secrets. Every secret
//! carries the cluster labels so deprovisioning can remove them by label.

use crate::driver::CapiHelmDriver;
use crate::error::DriverError;
use crate::values::CLOUD_CREDENTIALS_SUFFIX;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use cluster_model::{CLUSTER_UUID_LABEL, CertificateKind, Cluster, credential_name, resource_labels, sanitized_name};
use kube_resources::SECRET;
use openstack_client::{ApplicationCredential, OpenStackError, RequestContext};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Secret type Cluster API expects for certificate authorities
pub const CAPI_SECRET_TYPE: &str = "cluster.x-k8s.io/secret";

/// System trust bundles, tried in order when no CA file is configured.
/// The roots compiled into the binary are used when none is readable.
pub const SYSTEM_CA_BUNDLES: &[&str] = &[
    "/etc/ssl/certs/ca-certificates.crt",
    "/etc/pki/tls/certs/ca-bundle.crt",
    "/etc/ssl/ca-bundle.pem",
    "/etc/pki/ca-trust/extracted/pem/tls-ca-bundle.pem",
    "/etc/ssl/cert.pem",
];

#[derive(Debug, Serialize)]
struct CloudsYaml<'a> {
    clouds: BTreeMap<&'a str, Cloud<'a>>,
}

#[derive(Debug, Serialize)]
struct Cloud<'a> {
    identity_api_version: u8,
    region_name: Option<&'a str>,
    interface: &'a str,
    verify: bool,
    auth: CloudAuth<'a>,
}

#[derive(Debug, Serialize)]
struct CloudAuth<'a> {
    auth_url: &'a str,
    application_credential_id: &'a str,
    application_credential_secret: &'a str,
}

const PEM_LINE_WIDTH: usize = 64;

/// The Mozilla root set compiled into the binary, as a PEM bundle.
pub fn bundled_ca_roots() -> String {
    let mut bundle = String::new();
    for cert in webpki_root_certs::TLS_SERVER_ROOT_CERTS {
        let der: &[u8] = cert.as_ref();
        let encoded = STANDARD.encode(der);
        bundle.push_str("-----BEGIN CERTIFICATE-----\n");
        for (i, c) in encoded.chars().enumerate() {
            if i > 0 && i % PEM_LINE_WIDTH == 0 {
                bundle.push('\n');
            }
            bundle.push(c);
        }
        bundle.push_str("\n-----END CERTIFICATE-----\n");
    }
    bundle
}

/// Reads the configured CA file, else the first readable system bundle,
/// else the bundled roots.
pub(crate) async fn read_ca_bundle(ca_file: Option<&Path>, fallbacks: &[PathBuf]) -> Result<String, DriverError> {
    if let Some(path) = ca_file {
        return tokio::fs::read_to_string(path)
            .await
            .map_err(|e| DriverError::CaBundle(format!("{}: {}", path.display(), e)));
    }
    for path in fallbacks {
        if let Ok(bundle) = tokio::fs::read_to_string(path).await {
            debug!("Using CA bundle {}", path.display());
            return Ok(bundle);
        }
    }
    info!("No system CA bundle found, using the bundled roots");
    Ok(bundled_ca_roots())
}

impl CapiHelmDriver {
    /// Writes the cloud credentials and certificate secrets for a cluster.
    pub async fn provision_credentials(&self, context: &RequestContext, cluster: &Cluster) -> Result<(), DriverError> {
        let namespace = self.namespace(cluster);
        let labels = resource_labels(cluster);

        let credential = self.mint_application_credential(context, cluster).await?;
        let secret = credential.secret.as_deref().ok_or_else(|| {
            DriverError::InvalidConfig(format!("application credential {} was returned without a secret", credential.id))
        })?;

        let fallbacks: Vec<PathBuf> = SYSTEM_CA_BUNDLES.iter().map(PathBuf::from).collect();
        let ca_bundle = read_ca_bundle(self.config.ca_file.as_deref(), &fallbacks).await?;

        let clouds = CloudsYaml {
            clouds: BTreeMap::from([(
                "openstack",
                Cloud {
                    identity_api_version: 3,
                    region_name: self.config.region_name.as_deref(),
                    interface: &self.config.endpoint_interface,
                    verify: self.config.verify_ca,
                    auth: CloudAuth {
                        auth_url: self.identity.auth_url(),
                        application_credential_id: &credential.id,
                        application_credential_secret: secret,
                    },
                },
            )]),
        };

        self.resources
            .apply(
                &SECRET,
                &sanitized_name(&cluster.name, Some(CLOUD_CREDENTIALS_SUFFIX)),
                json!({
                    "metadata": {"labels": labels},
                    "stringData": {
                        "cacert": ca_bundle,
                        "clouds.yaml": serde_yaml::to_string(&clouds)?,
                    },
                }),
                Some(&namespace),
            )
            .await?;
        info!("Wrote cloud credentials for cluster {}", cluster.uuid);

        for kind in CertificateKind::ALL {
            let cert_ref = cluster.certificate_ref(kind).ok_or_else(|| {
                DriverError::InvalidConfig(format!(
                    "cluster {} has no {} certificate reference",
                    cluster.uuid,
                    kind.secret_suffix()
                ))
            })?;
            let authority = self.certificates.get_certificate(context, cert_ref).await?;

            self.resources
                .apply(
                    &SECRET,
                    &sanitized_name(&cluster.name, Some(kind.secret_suffix())),
                    json!({
                        "metadata": {"labels": labels},
                        "type": CAPI_SECRET_TYPE,
                        "stringData": {
                            "tls.crt": authority.certificate,
                            "tls.key": authority.decrypted_private_key()?,
                        },
                    }),
                    Some(&namespace),
                )
                .await?;
        }
        info!("Wrote certificate secrets for cluster {}", cluster.uuid);

        Ok(())
    }

    /// Creates the cluster's application credential, replacing one left
    /// behind by an earlier attempt. Its secret cannot be read back, so a
    /// leftover credential is revoked rather than reused.
    async fn mint_application_credential(
        &self,
        context: &RequestContext,
        cluster: &Cluster,
    ) -> Result<ApplicationCredential, DriverError> {
        let name = credential_name(&self.config.credential_prefix, &cluster.uuid);
        let description = format!("Magnum cluster ({})", cluster.uuid);

        match self
            .identity
            .create_application_credential(context, &cluster.user_id, &name, &description)
            .await
        {
            Ok(credential) => return Ok(credential),
            Err(OpenStackError::Conflict(_)) => {
                warn!("Application credential {} already exists, replacing it", name);
            }
            Err(e) => return Err(e.into()),
        }

        let existing = self
            .identity
            .find_application_credential(context, &name, &cluster.user_id)
            .await?;
        self.identity
            .delete_application_credential(context, &cluster.user_id, &existing.id)
            .await?;
        Ok(self
            .identity
            .create_application_credential(context, &cluster.user_id, &name, &description)
            .await?)
    }

    /// Removes the cluster's secrets and revokes its application credential.
    ///
    /// Safe to repeat: missing secrets and a missing credential are not errors.
    pub async fn deprovision_credentials(&self, context: &RequestContext, cluster: &Cluster) -> Result<(), DriverError> {
        self.resources
            .delete_all_by_label(&SECRET, CLUSTER_UUID_LABEL, &cluster.uuid, Some(&self.namespace(cluster)))
            .await?;

        let name = credential_name(&self.config.credential_prefix, &cluster.uuid);
        let credential = match self
            .identity
            .find_application_credential(context, &name, &cluster.user_id)
            .await
        {
            Ok(credential) => credential,
            Err(e) if e.is_not_found() => {
                debug!("Application credential {} already gone", name);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        match self
            .identity
            .delete_application_credential(context, &cluster.user_id, &credential.id)
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_not_found() => debug!("Application credential {} already gone", name),
            Err(e) => return Err(e.into()),
        }
        info!("Revoked application credential {} for cluster {}", name, cluster.uuid);
        Ok(())
    }
}
