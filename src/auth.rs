use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{Error, Result};

pub const TENANT_ID_VAR: &str = "AZURE_TENANT_ID";
pub const CLIENT_ID_VAR: &str = "AZURE_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "AZURE_CLIENT_SECRET";

/// Tokens are re-fetched this long before their reported expiry.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Service-principal credentials sourced from the process environment.
#[derive(Debug, Clone)]
pub struct CredentialConfig {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
}

impl CredentialConfig {
    /// Reads the three `AZURE_*` variables. Fails before any completion call
    /// is made when one is missing or blank.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            tenant_id: require_env(TENANT_ID_VAR)?,
            client_id: require_env(CLIENT_ID_VAR)?,
            client_secret: require_env(CLIENT_SECRET_VAR)?,
        })
    }
}

fn require_env(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(Error::Auth(format!(
            "Environment variable {name} must be set"
        ))),
    }
}

/// Produces bearer tokens for the completion client.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn bearer_token(&self) -> Result<String>;
}

/// OAuth2 client-credentials flow against the Microsoft identity platform,
/// with expiry-aware caching of the issued token.
pub struct ClientCredentialProvider {
    http: Client,
    credentials: CredentialConfig,
    token_url: String,
    scope: String,
    cached: Mutex<Option<CachedToken>>,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self, now: Instant) -> bool {
        now + REFRESH_MARGIN < self.expires_at
    }
}

impl ClientCredentialProvider {
    pub fn new(
        http: Client,
        credentials: CredentialConfig,
        authority: &str,
        scope: impl Into<String>,
    ) -> Self {
        let token_url = format!(
            "{}/{}/oauth2/v2.0/token",
            authority.trim_end_matches('/'),
            credentials.tenant_id
        );
        Self {
            http,
            credentials,
            token_url,
            scope: scope.into(),
            cached: Mutex::new(None),
        }
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    async fn fetch_token(&self) -> Result<CachedToken> {
        let form = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("grant_type", "client_credentials"),
            ("scope", self.scope.as_str()),
        ];
        let response = self
            .http
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|err| Error::Auth(format!("Token request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(Error::Auth(format!(
                "Identity provider rejected the token request (HTTP {}): {body}",
                status.as_u16()
            )));
        }

        let parsed: TokenResponse = response
            .json()
            .await
            .map_err(|err| Error::Auth(format!("Malformed token response: {err}")))?;
        debug!(expires_in = parsed.expires_in, "Acquired bearer token");
        Ok(CachedToken {
            value: parsed.access_token,
            expires_at: Instant::now() + Duration::from_secs(parsed.expires_in),
        })
    }
}

impl std::fmt::Debug for ClientCredentialProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentialProvider")
            .field("token_url", &self.token_url)
            .field("client_id", &self.credentials.client_id)
            .field("scope", &self.scope)
            .finish()
    }
}

#[async_trait]
impl TokenProvider for ClientCredentialProvider {
    async fn bearer_token(&self) -> Result<String> {
        let mut guard = self.cached.lock().await;
        if let Some(token) = guard.as_ref()
            && token.is_fresh(Instant::now())
        {
            return Ok(token.value.clone());
        }

        let token = self.fetch_token().await?;
        let value = token.value.clone();
        *guard = Some(token);
        Ok(value)
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}
