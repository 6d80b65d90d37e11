//! Token endpoint configuration.
//!
//! # Example (TOML)
//!
//! ```toml
//! [auth]
//! issuer = "https://auth.example.com"
//!
//! [auth.oauth]
//! access_token_lifetime = "1h"
//! grant_types = ["client_credentials"]
//! token_format = "jwt"
//!
//! [auth.signing]
//! secret = "a-very-long-hmac-secret-of-at-least-32-bytes"
//!
//! [[auth.clients]]
//! client_id = "c1"
//! client_secret = "$argon2id$v=19$..."
//! grant_types = ["client_credentials"]
//! scopes = ["api.read", "api.write"]
//! ```

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{Client, GrantType};

/// Minimum HMAC secret length accepted for JWT signing.
pub const MIN_SIGNING_SECRET_LEN: usize = 32;

/// Root token endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Issuer URL placed in the `iss` claim of JWT access tokens.
    pub issuer: String,

    /// OAuth 2.0 flow settings.
    pub oauth: OAuthConfig,

    /// Token signing settings.
    pub signing: SigningConfig,

    /// Statically registered clients.
    pub clients: Vec<Client>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer: "http://localhost:8080".to_string(),
            oauth: OAuthConfig::default(),
            signing: SigningConfig::default(),
            clients: Vec::new(),
        }
    }
}

/// Format of issued access tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenFormat {
    /// Random, unstructured bearer string.
    Opaque,
    /// HS256-signed JWT.
    Jwt,
}

/// OAuth 2.0 configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OAuthConfig {
    /// Default access token lifetime, overridable per client.
    #[serde(with = "humantime_serde")]
    pub access_token_lifetime: Duration,

    /// Grant types enabled on this server.
    pub grant_types: Vec<GrantType>,

    /// Access token format.
    pub token_format: TokenFormat,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            access_token_lifetime: Duration::from_secs(3600), // 1 hour
            grant_types: vec![GrantType::ClientCredentials],
            token_format: TokenFormat::Opaque,
        }
    }
}

impl OAuthConfig {
    /// Returns `true` if `grant` is enabled on this server.
    #[must_use]
    pub fn is_grant_type_enabled(&self, grant: GrantType) -> bool {
        self.grant_types.contains(&grant)
    }
}

/// Token signing configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SigningConfig {
    /// HMAC secret for HS256 JWT access tokens.
    /// Required when `oauth.token_format = "jwt"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),
}

impl AuthConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The issuer URL is empty
    /// - No grant type is enabled, or the access token lifetime is zero
    /// - JWT tokens are selected without a long enough signing secret
    /// - A client registration is invalid or registered twice
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.issuer.is_empty() {
            return Err(ConfigError::InvalidValue(
                "issuer cannot be empty".to_string(),
            ));
        }

        if self.oauth.grant_types.is_empty() {
            return Err(ConfigError::InvalidValue(
                "oauth.grant_types must enable at least one grant type".to_string(),
            ));
        }

        if self.oauth.access_token_lifetime.is_zero() {
            return Err(ConfigError::InvalidValue(
                "oauth.access_token_lifetime must be > 0".to_string(),
            ));
        }

        if self.oauth.token_format == TokenFormat::Jwt {
            match self.signing.secret.as_deref() {
                None | Some("") => {
                    return Err(ConfigError::Missing(
                        "signing.secret (required for jwt token format)".to_string(),
                    ));
                }
                Some(secret) if secret.len() < MIN_SIGNING_SECRET_LEN => {
                    return Err(ConfigError::InvalidValue(format!(
                        "signing.secret must be at least {MIN_SIGNING_SECRET_LEN} bytes"
                    )));
                }
                Some(_) => {}
            }
        }

        validate_clients(&self.clients)
    }
}

/// Validates a set of client registrations, rejecting duplicates.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` naming the first offending client.
pub fn validate_clients(clients: &[Client]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for client in clients {
        client.validate().map_err(|e| {
            ConfigError::InvalidValue(format!("client '{}': {e}", client.client_id))
        })?;
        if !seen.insert(client.client_id.as_str()) {
            return Err(ConfigError::InvalidValue(format!(
                "client '{}' is registered more than once",
                client.client_id
            )));
        }
    }
    Ok(())
}
