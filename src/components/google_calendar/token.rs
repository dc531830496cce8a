use crate::error::{auth_error, config_error, BotResult};
use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Read/write access to events
pub const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
/// Google rejects assertions valid for longer than an hour
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// Tokens this close to expiry are refreshed before use
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Anything that can hand out a bearer token for the Calendar API
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> BotResult<String>;
}

/// The fields of a service account JSON key that are needed to authenticate
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    /// Load a key from the JSON file downloaded from the Google Cloud console
    pub fn from_file(path: &Path) -> BotResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            config_error(&format!(
                "Failed to read service account key {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&content)
    }

    /// Parse a key from its JSON text
    pub fn from_json(json: &str) -> BotResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| config_error(&format!("Invalid service account key: {}", e)))
    }
}

/// JWT claims for the OAuth 2.0 service account flow
#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: i64,
}

impl CachedToken {
    fn is_fresh(&self, now: i64) -> bool {
        self.expires_at - EXPIRY_MARGIN_SECS > now
    }
}

/// Mints and caches access tokens for a service account
#[derive(Clone)]
pub struct TokenManager {
    key: Arc<ServiceAccountKey>,
    encoding_key: Arc<EncodingKey>,
    client: Client,
    cached: Arc<RwLock<Option<CachedToken>>>,
}

impl fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenManager")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    /// Create a token manager, validating the private key up front
    pub fn new(key: ServiceAccountKey) -> BotResult<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| config_error(&format!("Invalid service account private key: {}", e)))?;

        Ok(Self {
            key: Arc::new(key),
            encoding_key: Arc::new(encoding_key),
            client: Client::new(),
            cached: Arc::new(RwLock::new(None)),
        })
    }

    /// Create a token manager from a service account key file
    pub fn from_service_account_file(path: &Path) -> BotResult<Self> {
        let manager = Self::new(ServiceAccountKey::from_file(path)?)?;
        info!(
            "Loaded service account {} for Google Calendar",
            manager.key.client_email
        );
        Ok(manager)
    }

    /// Sign the JWT grant sent to the token endpoint
    fn signed_assertion(&self, now: i64) -> BotResult<String> {
        let claims = Claims {
            iss: &self.key.client_email,
            scope: CALENDAR_SCOPE,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };

        encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .map_err(|e| auth_error(&format!("Failed to sign token request: {}", e)))
    }

    /// Exchange a fresh assertion for an access token
    async fn request_token(&self) -> BotResult<CachedToken> {
        let now = Utc::now().timestamp();
        let assertion = self.signed_assertion(now)?;

        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| auth_error(&format!("Failed to request token: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(auth_error(&format!(
                "Failed to request token: HTTP {} - {}",
                status, error_body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| auth_error(&format!("Failed to parse token response: {}", e)))?;

        debug!("Obtained access token valid for {}s", token.expires_in);

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: now + token.expires_in,
        })
    }
}

#[async_trait]
impl TokenSource for TokenManager {
    async fn access_token(&self) -> BotResult<String> {
        {
            let cached = self.cached.read().await;
            if let Some(token) = cached.as_ref() {
                if token.is_fresh(Utc::now().timestamp()) {
                    return Ok(token.access_token.clone());
                }
            }
        }

        let mut cached = self.cached.write().await;
        // Another caller may have refreshed while we waited for the lock
        if let Some(token) = cached.as_ref() {
            if token.is_fresh(Utc::now().timestamp()) {
                return Ok(token.access_token.clone());
            }
        }

        let token = self.request_token().await?;
        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }
}
