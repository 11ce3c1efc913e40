//! Key manager (Barbican) client
//!
//! A certificate container holds `certificate`, `private_key` and optionally
//! `private_key_passphrase` secrets. Each secret's payload is fetched from
//! `{secret_ref}/payload`.

use crate::context::RequestContext;
use crate::error::OpenStackError;
use crate::models::CertificateAuthority;
use crate::openstack_trait::CertificateClientTrait;
use crate::session::Session;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct SecretRef {
    name: String,
    secret_ref: String,
}

#[derive(Debug, Deserialize)]
struct Container {
    #[serde(default)]
    secret_refs: Vec<SecretRef>,
}

impl Container {
    fn secret_ref(&self, name: &str) -> Option<&str> {
        self.secret_refs
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.secret_ref.as_str())
    }
}

/// Barbican client
#[derive(Debug, Clone)]
pub struct CertificateClient {
    session: Arc<Session>,
    endpoint: String,
}

impl CertificateClient {
    /// Create a new key manager client
    ///
    /// # Arguments
    /// * `endpoint` - Barbican endpoint (e.g., "https://barbican:9311"), used for bare container ids
    pub fn new(session: Arc<Session>, endpoint: impl Into<String>) -> Self {
        Self {
            session,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }

    fn container_url(&self, cert_ref: &str) -> String {
        if cert_ref.starts_with("http") {
            cert_ref.to_string()
        } else {
            Session::build_url(&self.endpoint, &format!("v1/containers/{}", cert_ref))
        }
    }

    async fn payload(&self, context: &RequestContext, secret_ref: &str) -> Result<String, OpenStackError> {
        self.session.get_text(context, &format!("{}/payload", secret_ref.trim_end_matches('/'))).await
    }
}

#[async_trait::async_trait]
impl CertificateClientTrait for CertificateClient {
    async fn get_certificate(
        &self,
        context: &RequestContext,
        cert_ref: &str,
    ) -> Result<CertificateAuthority, OpenStackError> {
        let url = self.container_url(cert_ref);
        debug!("Fetching certificate container {}", url);
        let container: Container = self.session.get(context, &url).await?;

        let certificate_ref = container
            .secret_ref("certificate")
            .ok_or_else(|| OpenStackError::NotFound(format!("certificate secret in container {}", cert_ref)))?;
        let private_key_ref = container
            .secret_ref("private_key")
            .ok_or_else(|| OpenStackError::NotFound(format!("private_key secret in container {}", cert_ref)))?;

        let certificate = self.payload(context, certificate_ref).await?;
        let private_key = self.payload(context, private_key_ref).await?;
        let private_key_passphrase = match container.secret_ref("private_key_passphrase") {
            Some(r) => Some(self.payload(context, r).await?),
            None => None,
        };

        Ok(CertificateAuthority {
            certificate,
            private_key,
            private_key_passphrase,
        })
    }
}
