//! Authenticated session shared by the service clients
//!
//! Authenticates against Keystone with an application credential and caches
//! the issued token until shortly before it expires. Requests made for a user
//! carry that user's token instead.

use crate::context::RequestContext;
use crate::error::OpenStackError;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const SUBJECT_TOKEN_HEADER: &str = "X-Subject-Token";
const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Tokens are renewed this long before Keystone says they expire
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Clone)]
struct Token {
    value: String,
    expires_at: DateTime<Utc>,
}

impl Token {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + ChronoDuration::seconds(TOKEN_EXPIRY_MARGIN_SECS) < self.expires_at
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    token: TokenBody,
}

#[derive(Deserialize)]
struct TokenBody {
    expires_at: DateTime<Utc>,
}

/// Keystone session authenticated with an application credential
pub struct Session {
    client: Client,
    auth_url: String,
    application_credential_id: String,
    application_credential_secret: String,
    token: Mutex<Option<Token>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("auth_url", &self.auth_url)
            .field("application_credential_id", &self.application_credential_id)
            .finish_non_exhaustive()
    }
}

/// Maps a non-success response to an error, consuming it.
pub(crate) async fn error_for_status(
    response: Response,
    method: &str,
    url: &str,
) -> Result<Response, OpenStackError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(match status {
        StatusCode::NOT_FOUND => OpenStackError::NotFound(format!("{} {} - {}", method, url, body)),
        StatusCode::UNAUTHORIZED => {
            OpenStackError::Authentication(format!("{} {} failed: {} - {}", method, url, status, body))
        }
        StatusCode::FORBIDDEN => OpenStackError::Forbidden(format!("{} {} - {}", method, url, body)),
        StatusCode::CONFLICT => OpenStackError::Conflict(format!("{} {} - {}", method, url, body)),
        _ => OpenStackError::Api(format!("{} {} failed: {} - {}", method, url, status, body)),
    })
}

impl Session {
    /// Create a new session
    ///
    /// # Arguments
    /// * `auth_url` - Keystone v3 endpoint (e.g., "https://keystone:5000/v3")
    /// * `application_credential_id` / `application_credential_secret` - credential the service authenticates with
    pub fn new(
        client: Client,
        auth_url: impl Into<String>,
        application_credential_id: impl Into<String>,
        application_credential_secret: impl Into<String>,
    ) -> Self {
        Self {
            client,
            auth_url: auth_url.into().trim_end_matches('/').to_string(),
            application_credential_id: application_credential_id.into(),
            application_credential_secret: application_credential_secret.into(),
            token: Mutex::new(None),
        }
    }

    /// Keystone endpoint
    pub fn auth_url(&self) -> &str {
        &self.auth_url
    }

    /// Build a full URL under `base` from a path; absolute URLs pass through.
    pub fn build_url(base: &str, path: &str) -> String {
        if path.starts_with("http") {
            path.to_string()
        } else {
            format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
        }
    }

    /// Current token, authenticating if none is cached or it is about to expire.
    pub async fn token(&self) -> Result<String, OpenStackError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(Utc::now())) {
            return Ok(token.value.clone());
        }

        let token = self.authenticate().await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    /// Drop the cached token if it is still `rejected`, so the next request re-authenticates.
    ///
    /// A token another request already renewed is kept.
    pub async fn invalidate(&self, rejected: &str) {
        let mut cached = self.token.lock().await;
        if cached.as_ref().is_some_and(|t| t.value == rejected) {
            *cached = None;
        }
    }

    async fn authenticate(&self) -> Result<Token, OpenStackError> {
        let url = Self::build_url(&self.auth_url, "auth/tokens");
        info!("Authenticating to {} with application credential {}", url, self.application_credential_id);

        let body = json!({
            "auth": {
                "identity": {
                    "methods": ["application_credential"],
                    "application_credential": {
                        "id": self.application_credential_id,
                        "secret": self.application_credential_secret,
                    }
                }
            }
        });
        let response = self.client
            .post(&url)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await?;
        let response = error_for_status(response, "POST", &url).await?;

        let value = response
            .headers()
            .get(SUBJECT_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| OpenStackError::Authentication(format!("{} missing from token response", SUBJECT_TOKEN_HEADER)))?;
        let parsed: TokenResponse = response.json().await?;

        debug!("Token issued, expires at {}", parsed.token.expires_at);
        Ok(Token {
            value,
            expires_at: parsed.token.expires_at,
        })
    }

    /// Send a request under `context`, retrying once with a new service token on 401.
    ///
    /// A rejected user token is not retried; only the service session can log in again.
    async fn send(
        &self,
        context: &RequestContext,
        method: Method,
        url: &str,
        build: impl Fn(RequestBuilder) -> RequestBuilder,
    ) -> Result<Response, OpenStackError> {
        debug!("{} {}", method, url);
        let token = match context.auth_token.as_deref() {
            Some(token) => token.to_string(),
            None => self.token().await?,
        };
        let response = build(self.client.request(method.clone(), url))
            .header(AUTH_TOKEN_HEADER, token.as_str())
            .send()
            .await?;

        if response.status() != StatusCode::UNAUTHORIZED || !context.is_service() {
            return error_for_status(response, method.as_str(), url).await;
        }

        warn!("Service token rejected by {} {}, re-authenticating", method, url);
        self.invalidate(&token).await;
        let response = build(self.client.request(method.clone(), url))
            .header(AUTH_TOKEN_HEADER, self.token().await?)
            .send()
            .await?;
        error_for_status(response, method.as_str(), url).await
    }

    /// Make an authenticated GET request and decode the JSON body
    pub async fn get<T: DeserializeOwned>(&self, context: &RequestContext, url: &str) -> Result<T, OpenStackError> {
        let response = self
            .send(context, Method::GET, url, |r| r.header("Accept", "application/json"))
            .await?;
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Make an authenticated GET request and return the raw body as text
    pub async fn get_text(&self, context: &RequestContext, url: &str) -> Result<String, OpenStackError> {
        let response = self
            .send(context, Method::GET, url, |r| r.header("Accept", "text/plain"))
            .await?;
        Ok(response.text().await?)
    }

    /// Make an authenticated POST request
    ///
    /// Request bodies can carry secrets, so only the URL is logged.
    pub async fn post<T: DeserializeOwned>(
        &self,
        context: &RequestContext,
        url: &str,
        body: &Value,
    ) -> Result<T, OpenStackError> {
        let response = self
            .send(context, Method::POST, url, |r| r.header("Accept", "application/json").json(body))
            .await?;
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Make an authenticated DELETE request
    pub async fn delete(&self, context: &RequestContext, url: &str) -> Result<(), OpenStackError> {
        self.send(context, Method::DELETE, url, |r| r).await?;
        Ok(())
    }
}
