//! Caller identity for OpenStack requests

/// Who a request is made on behalf of.
///
/// With an `auth_token` the request carries the user's own token, so Keystone
/// policy is evaluated for that user. Without one the service session is used.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub user_id: Option<String>,
    pub project_id: Option<String>,
    pub auth_token: Option<String>,
}

impl RequestContext {
    /// Context for a user holding a Keystone token
    pub fn for_user(
        user_id: impl Into<String>,
        project_id: impl Into<String>,
        auth_token: impl Into<String>,
    ) -> Self {
        Self {
            user_id: Some(user_id.into()),
            project_id: Some(project_id.into()),
            auth_token: Some(auth_token.into()),
        }
    }

    /// Context for work the service does on its own behalf, such as periodic status passes
    pub fn service() -> Self {
        Self::default()
    }

    /// True when requests go out under the service session
    pub fn is_service(&self) -> bool {
        self.auth_token.is_none()
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("user_id", &self.user_id)
            .field("project_id", &self.project_id)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
