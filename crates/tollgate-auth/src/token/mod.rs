//! Access token minting.
//!
//! The token endpoint does not prescribe a token format. An
//! [`AccessTokenStrategy`] turns a validated request into the bearer string
//! handed to the client:
//!
//! - [`OpaqueTokenStrategy`] - random, unstructured tokens
//! - [`JwtTokenStrategy`] - self-contained HS256 JWTs

pub mod jwt;
pub mod opaque;

use std::sync::Arc;
use std::time::Duration;

use crate::AuthResult;
use crate::config::{AuthConfig, ConfigError, TokenFormat};
use crate::oauth::request::AccessRequest;
use crate::oauth::session::Session;

pub use jwt::{AccessTokenClaims, JwtTokenStrategy};
pub use opaque::OpaqueTokenStrategy;

/// Produces access token strings.
pub trait AccessTokenStrategy: Send + Sync {
    /// Mints an access token for `request`, valid for `lifetime`.
    ///
    /// # Errors
    ///
    /// Returns a server-class `AuthError` if the token cannot be produced.
    fn generate(
        &self,
        request: &AccessRequest,
        session: &Session,
        lifetime: Duration,
    ) -> AuthResult<String>;
}

/// Builds the strategy selected by `auth.oauth.token_format`.
///
/// # Errors
///
/// Returns `ConfigError::Missing` if JWT tokens are selected without a
/// signing secret.
pub fn strategy_from_config(config: &AuthConfig) -> Result<Arc<dyn AccessTokenStrategy>, ConfigError> {
    match config.oauth.token_format {
        TokenFormat::Opaque => Ok(Arc::new(OpaqueTokenStrategy)),
        TokenFormat::Jwt => {
            let secret = config
                .signing
                .secret
                .as_deref()
                .filter(|s| !s.is_empty())
                .ok_or_else(|| ConfigError::Missing("signing.secret".to_string()))?;
            Ok(Arc::new(JwtTokenStrategy::new(
                secret.as_bytes(),
                config.issuer.clone(),
            )))
        }
    }
}
