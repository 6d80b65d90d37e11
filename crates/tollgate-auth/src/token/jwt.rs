//! Self-contained JWT access tokens.
//!
//! Tokens are signed with HS256 under a shared secret from configuration.
//! Resource servers holding the same secret can validate them offline.
//!
//! # Example
//!
//! ```ignore
//! let strategy = JwtTokenStrategy::new(secret.as_bytes(), "https://auth.example.com");
//! let token = strategy.generate(&request, &session, Duration::from_secs(3600))?;
//! ```

use std::time::Duration;

use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

use crate::AuthResult;
use crate::error::AuthError;
use crate::oauth::request::AccessRequest;
use crate::oauth::session::Session;
use crate::token::AccessTokenStrategy;

/// Claim names owned by [`AccessTokenClaims`]. Session claims with these names are dropped.
pub const REGISTERED_CLAIMS: &[&str] = &[
    "iss", "sub", "aud", "client_id", "scope", "iat", "nbf", "exp", "jti",
];

/// Claims carried by a JWT access token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessTokenClaims {
    /// Issuer.
    pub iss: String,

    /// Subject (the client itself for client_credentials).
    pub sub: String,

    /// Audiences the client is registered for.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aud: Vec<String>,

    /// OAuth client ID.
    pub client_id: String,

    /// Space-separated granted scopes.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub scope: String,

    /// Issued at (Unix timestamp).
    pub iat: i64,

    /// Expiration time (Unix timestamp).
    pub exp: i64,

    /// JWT ID.
    pub jti: String,

    /// Extra claims recorded on the session by grant handlers.
    ///
    /// Never contains a name from [`REGISTERED_CLAIMS`].
    #[serde(flatten)]
    pub ext: Map<String, Value>,
}

impl AccessTokenClaims {
    /// Assembles the claims for `request`, issued now and valid for `lifetime`.
    #[must_use]
    pub fn for_request(
        issuer: &str,
        request: &AccessRequest,
        session: &Session,
        lifetime: Duration,
    ) -> Self {
        let client = request.client();
        let iat = OffsetDateTime::now_utc().unix_timestamp();
        let ttl = i64::try_from(lifetime.as_secs()).unwrap_or(i64::MAX);

        Self {
            iss: issuer.to_string(),
            sub: session
                .subject
                .clone()
                .unwrap_or_else(|| client.client_id.clone()),
            aud: client.audience.clone(),
            client_id: client.client_id.clone(),
            scope: request.granted_scopes().to_string(),
            iat,
            exp: iat.saturating_add(ttl),
            jti: Uuid::new_v4().to_string(),
            ext: extension_claims(session),
        }
    }
}

fn extension_claims(session: &Session) -> Map<String, Value> {
    session
        .extra
        .iter()
        .filter(|(name, _)| {
            let registered = REGISTERED_CLAIMS.contains(&name.as_str());
            if registered {
                warn!(
                    request_id = %session.request_id,
                    claim = %name,
                    "Dropping session claim that shadows a registered claim"
                );
            }
            !registered
        })
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

/// HS256 JWT access token strategy.
#[derive(Clone)]
pub struct JwtTokenStrategy {
    encoding_key: EncodingKey,
    issuer: String,
}

impl JwtTokenStrategy {
    /// Creates a strategy signing with `secret` on behalf of `issuer`.
    #[must_use]
    pub fn new(secret: &[u8], issuer: impl Into<String>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            issuer: issuer.into(),
        }
    }

    /// The `iss` claim placed in every token.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }
}

impl std::fmt::Debug for JwtTokenStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtTokenStrategy")
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

impl AccessTokenStrategy for JwtTokenStrategy {
    fn generate(
        &self,
        request: &AccessRequest,
        session: &Session,
        lifetime: Duration,
    ) -> AuthResult<String> {
        let claims = AccessTokenClaims::for_request(&self.issuer, request, session, lifetime);
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::internal(format!("Failed to sign access token: {e}")))
    }
}
