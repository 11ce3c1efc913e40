//! Identity (Keystone) client
//!
//! Application credentials: `/v3/users/{user_id}/application_credentials`.
//! Keystone only lets the owning user create one, so creation needs the
//! user's own token in the request context.

use crate::context::RequestContext;
use crate::error::OpenStackError;
use crate::models::ApplicationCredential;
use crate::openstack_trait::IdentityClientTrait;
use crate::session::Session;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Deserialize)]
struct CredentialEnvelope {
    application_credential: ApplicationCredential,
}

#[derive(Deserialize)]
struct CredentialList {
    #[serde(default)]
    application_credentials: Vec<ApplicationCredential>,
}

/// Keystone client
#[derive(Debug, Clone)]
pub struct IdentityClient {
    session: Arc<Session>,
}

impl IdentityClient {
    /// Create a new identity client on a shared session
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    fn credentials_url(&self, user_id: &str) -> String {
        Session::build_url(
            self.session.auth_url(),
            &format!("users/{}/application_credentials", urlencoding::encode(user_id)),
        )
    }
}

#[async_trait::async_trait]
impl IdentityClientTrait for IdentityClient {
    fn auth_url(&self) -> &str {
        self.session.auth_url()
    }

    async fn create_application_credential(
        &self,
        context: &RequestContext,
        user_id: &str,
        name: &str,
        description: &str,
    ) -> Result<ApplicationCredential, OpenStackError> {
        info!("Creating application credential {} for user {}", name, user_id);
        let body = json!({
            "application_credential": {
                "name": name,
                "description": description,
            }
        });
        let envelope: CredentialEnvelope = self.session.post(context, &self.credentials_url(user_id), &body).await?;
        Ok(envelope.application_credential)
    }

    async fn find_application_credential(
        &self,
        context: &RequestContext,
        name: &str,
        user_id: &str,
    ) -> Result<ApplicationCredential, OpenStackError> {
        let url = format!("{}?name={}", self.credentials_url(user_id), urlencoding::encode(name));
        let list: CredentialList = self.session.get(context, &url).await?;
        debug!("Found {} application credentials named {}", list.application_credentials.len(), name);

        list.application_credentials
            .into_iter()
            .find(|c| c.name == name)
            .ok_or_else(|| OpenStackError::NotFound(format!("application credential {} for user {}", name, user_id)))
    }

    async fn delete_application_credential(
        &self,
        context: &RequestContext,
        user_id: &str,
        credential_id: &str,
    ) -> Result<(), OpenStackError> {
        info!("Deleting application credential {} for user {}", credential_id, user_id);
        let url = format!("{}/{}", self.credentials_url(user_id), urlencoding::encode(credential_id));
        self.session.delete(context, &url).await
    }
}
