//! OpenStack client traits for mocking
//!
//! The driver depends on these traits rather than on the concrete clients so
//! unit tests can substitute `MockOpenStackClient`. Every call carries the
//! [`RequestContext`] it is made on behalf of.

use crate::context::RequestContext;
use crate::error::OpenStackError;
use crate::models::{ApplicationCredential, CertificateAuthority, Image};

/// Identity service operations
#[async_trait::async_trait]
pub trait IdentityClientTrait: Send + Sync {
    /// Keystone endpoint written into generated cloud configuration
    fn auth_url(&self) -> &str;

    /// Create an application credential owned by `user_id`. The result carries the secret.
    async fn create_application_credential(
        &self,
        context: &RequestContext,
        user_id: &str,
        name: &str,
        description: &str,
    ) -> Result<ApplicationCredential, OpenStackError>;

    /// Find an application credential by name. `NotFound` when absent.
    async fn find_application_credential(
        &self,
        context: &RequestContext,
        name: &str,
        user_id: &str,
    ) -> Result<ApplicationCredential, OpenStackError>;

    async fn delete_application_credential(
        &self,
        context: &RequestContext,
        user_id: &str,
        credential_id: &str,
    ) -> Result<(), OpenStackError>;
}

/// Key manager operations
#[async_trait::async_trait]
pub trait CertificateClientTrait: Send + Sync {
    /// Fetch certificate material from a container reference (URL or bare id)
    async fn get_certificate(
        &self,
        context: &RequestContext,
        cert_ref: &str,
    ) -> Result<CertificateAuthority, OpenStackError>;
}

/// Image service operations
#[async_trait::async_trait]
pub trait ImageClientTrait: Send + Sync {
    /// Resolve an image by id or unique name
    async fn resolve_image(&self, context: &RequestContext, identifier: &str) -> Result<Image, OpenStackError>;
}
