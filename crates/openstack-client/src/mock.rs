//! Mock OpenStack client for unit testing
//!
//! One value implements the identity, key manager and image traits, backed by
//! in-memory maps. Clones share state. Like Keystone, only the owning user
//! may create an application credential.

use crate::context::RequestContext;
use crate::error::OpenStackError;
use crate::image::unique_image;
use crate::models::{ApplicationCredential, CertificateAuthority, Image};
use crate::openstack_trait::{CertificateClientTrait, IdentityClientTrait, ImageClientTrait};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Mock OpenStack services
#[derive(Debug, Clone)]
pub struct MockOpenStackClient {
    auth_url: String,
    /// Keyed by (user_id, name)
    credentials: Arc<Mutex<BTreeMap<(String, String), ApplicationCredential>>>,
    deleted_credentials: Arc<Mutex<Vec<String>>>,
    certificates: Arc<Mutex<BTreeMap<String, CertificateAuthority>>>,
    images: Arc<Mutex<Vec<Image>>>,
}

impl MockOpenStackClient {
    /// Create a new mock client
    pub fn new(auth_url: impl Into<String>) -> Self {
        Self {
            auth_url: auth_url.into(),
            credentials: Arc::new(Mutex::new(BTreeMap::new())),
            deleted_credentials: Arc::new(Mutex::new(Vec::new())),
            certificates: Arc::new(Mutex::new(BTreeMap::new())),
            images: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Store certificate material under a container reference
    pub fn add_certificate(&self, cert_ref: impl Into<String>, authority: CertificateAuthority) {
        self.certificates.lock().unwrap().insert(cert_ref.into(), authority);
    }

    /// Register an image
    pub fn add_image(&self, id: impl Into<String>, name: impl Into<String>) {
        self.images.lock().unwrap().push(Image {
            id: id.into(),
            name: Some(name.into()),
            status: Some("active".to_string()),
        });
    }

    /// Application credentials that currently exist
    pub fn application_credentials(&self) -> Vec<ApplicationCredential> {
        self.credentials.lock().unwrap().values().cloned().collect()
    }

    /// Ids of every application credential deleted so far
    pub fn deleted_credentials(&self) -> Vec<String> {
        self.deleted_credentials.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl IdentityClientTrait for MockOpenStackClient {
    fn auth_url(&self) -> &str {
        &self.auth_url
    }

    async fn create_application_credential(
        &self,
        context: &RequestContext,
        user_id: &str,
        name: &str,
        description: &str,
    ) -> Result<ApplicationCredential, OpenStackError> {
        if context.is_service() || context.user_id.as_deref() != Some(user_id) {
            return Err(OpenStackError::Forbidden(format!(
                "application credentials for user {} can only be created by that user",
                user_id
            )));
        }

        let mut credentials = self.credentials.lock().unwrap();
        let key = (user_id.to_string(), name.to_string());
        if credentials.contains_key(&key) {
            return Err(OpenStackError::Conflict(format!("application credential {} already exists", name)));
        }

        let credential = ApplicationCredential {
            id: Uuid::new_v4().simple().to_string(),
            name: name.to_string(),
            secret: Some(Uuid::new_v4().to_string()),
            description: Some(description.to_string()),
            project_id: None,
        };
        let mut stored = credential.clone();
        stored.secret = None;
        credentials.insert(key, stored);
        Ok(credential)
    }

    async fn find_application_credential(
        &self,
        _context: &RequestContext,
        name: &str,
        user_id: &str,
    ) -> Result<ApplicationCredential, OpenStackError> {
        self.credentials
            .lock()
            .unwrap()
            .get(&(user_id.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| OpenStackError::NotFound(format!("application credential {} for user {}", name, user_id)))
    }

    async fn delete_application_credential(
        &self,
        _context: &RequestContext,
        user_id: &str,
        credential_id: &str,
    ) -> Result<(), OpenStackError> {
        let mut credentials = self.credentials.lock().unwrap();
        let key = credentials
            .iter()
            .find(|((user, _), c)| user == user_id && c.id == credential_id)
            .map(|(k, _)| k.clone())
            .ok_or_else(|| OpenStackError::NotFound(format!("application credential {}", credential_id)))?;
        credentials.remove(&key);
        self.deleted_credentials.lock().unwrap().push(credential_id.to_string());
        Ok(())
    }
}

#[async_trait::async_trait]
impl CertificateClientTrait for MockOpenStackClient {
    async fn get_certificate(
        &self,
        _context: &RequestContext,
        cert_ref: &str,
    ) -> Result<CertificateAuthority, OpenStackError> {
        self.certificates
            .lock()
            .unwrap()
            .get(cert_ref)
            .cloned()
            .ok_or_else(|| OpenStackError::NotFound(format!("certificate container {}", cert_ref)))
    }
}

#[async_trait::async_trait]
impl ImageClientTrait for MockOpenStackClient {
    async fn resolve_image(&self, _context: &RequestContext, identifier: &str) -> Result<Image, OpenStackError> {
        let images = self.images.lock().unwrap();
        if Uuid::parse_str(identifier).is_ok() {
            return images
                .iter()
                .find(|i| i.id == identifier)
                .cloned()
                .ok_or_else(|| OpenStackError::NotFound(format!("image {}", identifier)));
        }
        let matching = images
            .iter()
            .filter(|i| i.name.as_deref() == Some(identifier))
            .cloned()
            .collect();
        unique_image(identifier, matching)
    }
}
