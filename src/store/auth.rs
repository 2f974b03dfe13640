//! OAuth2 access tokens for Google APIs.
//!
//! Firestore's REST API takes a bearer token. `ServiceAccountTokenProvider`
//! mints one from a service account key via the JWT-bearer grant and keeps
//! it until shortly before expiry.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, error};

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Seconds before expiry at which a cached token is considered stale.
const EXPIRY_MARGIN_SECS: i64 = 60;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// Service account key structure (from Google JSON key file)
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    /// Project the service account belongs to
    #[serde(default)]
    pub project_id: String,
    /// Service account email address
    pub client_email: String,
    /// RSA private key in PEM format
    pub private_key: String,
    /// Key ID, sent as the JWT `kid`
    #[serde(default)]
    pub private_key_id: String,
    /// OAuth2 token endpoint
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl ServiceAccountKey {
    /// Parse a service account JSON blob.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("failed to parse service account JSON")
    }
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

/// Source of bearer tokens for outbound Google API calls.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Return a currently valid access token.
    async fn access_token(&self) -> Result<String>;
}

/// Fixed token, for emulators and tests.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String> {
        Ok(self.token.clone())
    }
}

#[derive(Clone)]
struct CachedToken {
    access_token: String,
    expires_at: i64,
}

/// JWT claims for the Google OAuth2 JWT-bearer grant
#[derive(Debug, Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

/// Token response from Google OAuth2
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Mints access tokens from a service account key.
pub struct ServiceAccountTokenProvider {
    key: ServiceAccountKey,
    scope: String,
    client: Client,
    token_cache: RwLock<Option<CachedToken>>,
}

impl ServiceAccountTokenProvider {
    /// Create a provider for the Datastore/Firestore scope.
    pub fn new(key: ServiceAccountKey) -> Self {
        Self {
            key,
            scope: DATASTORE_SCOPE.to_string(),
            client: Client::new(),
            token_cache: RwLock::new(None),
        }
    }

    fn sign_assertion(&self, now: i64) -> Result<String> {
        let claims = JwtClaims {
            iss: &self.key.client_email,
            scope: &self.scope,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + 3600,
        };

        let mut header = Header::new(Algorithm::RS256);
        if !self.key.private_key_id.is_empty() {
            header.kid = Some(self.key.private_key_id.clone());
        }

        let key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .map_err(|e| anyhow!("Invalid private key: {}", e))?;

        jsonwebtoken::encode(&header, &claims, &key).map_err(|e| anyhow!("Failed to create JWT: {}", e))
    }

    async fn fetch_access_token(&self) -> Result<TokenResponse> {
        let assertion = self.sign_assertion(Utc::now().timestamp())?;

        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| anyhow!("Token request failed: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "Token exchange failed");
            return Err(anyhow!("Token exchange failed ({}): {}", status, error_body));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| anyhow!("Failed to parse token response: {}", e))
    }
}

#[async_trait]
impl TokenProvider for ServiceAccountTokenProvider {
    async fn access_token(&self) -> Result<String> {
        {
            let cache = self.token_cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.expires_at > Utc::now().timestamp() + EXPIRY_MARGIN_SECS {
                    return Ok(cached.access_token.clone());
                }
            }
        }

        let mut cache = self.token_cache.write().await;
        // Another request may have refreshed while we waited for the lock.
        if let Some(cached) = cache.as_ref() {
            if cached.expires_at > Utc::now().timestamp() + EXPIRY_MARGIN_SECS {
                return Ok(cached.access_token.clone());
            }
        }

        let token = self.fetch_access_token().await?;
        debug!(expires_in = token.expires_in, "Fetched new access token");

        *cache = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at: Utc::now().timestamp() + token.expires_in,
        });

        Ok(token.access_token)
    }
}
