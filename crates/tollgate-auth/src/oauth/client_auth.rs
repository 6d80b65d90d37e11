//! Client authentication for the token endpoint.
//!
//! # Authentication Methods
//!
//! - `client_secret_basic` - HTTP Basic Auth with client_id:client_secret
//! - `client_secret_post` - client_id and client_secret in request body
//! - `none` - Public clients (client_id only)
//!
//! Methods are tried in that order. A request may use only one of them.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::AuthResult;
use crate::error::AuthError;
use crate::oauth::token::TokenRequest;
use crate::storage::ClientStorage;
use crate::types::Client;

/// Result of successful client authentication.
#[derive(Debug, Clone)]
pub struct AuthenticatedClient {
    /// The authenticated client.
    pub client: Arc<Client>,

    /// The authentication method used.
    pub auth_method: TokenEndpointAuthMethod,
}

/// Token endpoint authentication methods.
///
/// Defined in OpenID Connect Core Section 9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenEndpointAuthMethod {
    /// No client authentication (public clients).
    None,

    /// Client secret via HTTP Basic Auth.
    ClientSecretBasic,

    /// Client secret in request body.
    ClientSecretPost,
}

impl TokenEndpointAuthMethod {
    /// Returns the string representation of the auth method.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::ClientSecretBasic => "client_secret_basic",
            Self::ClientSecretPost => "client_secret_post",
        }
    }
}

impl fmt::Display for TokenEndpointAuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Authenticates the client of a token request.
///
/// `authorization` is the raw `Authorization` header value, if any. Only the
/// `Basic` scheme is interpreted; other schemes are ignored.
///
/// # Errors
///
/// - `invalid_request` if credentials are presented by more than one method,
///   or the body `client_id` disagrees with the Basic credentials
/// - `invalid_client` if the Basic header is malformed, no client is
///   identified, the client is unknown or inactive, the secret does not
///   match, or the method does not fit the client type
pub async fn authenticate_client(
    request: &TokenRequest,
    authorization: Option<&str>,
    client_storage: &dyn ClientStorage,
) -> AuthResult<AuthenticatedClient> {
    let basic = match authorization {
        Some(value) if is_basic_scheme(value) => Some(
            parse_basic_auth(value)
                .ok_or_else(|| AuthError::invalid_client("Malformed HTTP Basic credentials"))?,
        ),
        _ => None,
    };

    // 1. HTTP Basic Auth
    if let Some((client_id, client_secret)) = basic {
        if request.client_secret.is_some() {
            return Err(AuthError::invalid_request(
                "Client credentials must not be sent both in the Authorization header and the request body",
            ));
        }
        if request.client_id.as_deref().is_some_and(|id| id != client_id) {
            return Err(AuthError::invalid_request(
                "client_id does not match the Authorization header",
            ));
        }
        return authenticate_with_secret(
            &client_id,
            &client_secret,
            TokenEndpointAuthMethod::ClientSecretBasic,
            client_storage,
        )
        .await;
    }

    // 2. client_secret_post
    if let (Some(client_id), Some(client_secret)) = (&request.client_id, &request.client_secret) {
        return authenticate_with_secret(
            client_id,
            client_secret,
            TokenEndpointAuthMethod::ClientSecretPost,
            client_storage,
        )
        .await;
    }

    // 3. Public client
    if let Some(client_id) = &request.client_id {
        return authenticate_public(client_id, client_storage).await;
    }

    Err(AuthError::invalid_client("No client credentials provided"))
}

async fn find_active(client_id: &str, client_storage: &dyn ClientStorage) -> AuthResult<Arc<Client>> {
    let client = client_storage
        .find_by_client_id(client_id)
        .await?
        .ok_or_else(|| AuthError::invalid_client("Unknown client"))?;

    if !client.active {
        return Err(AuthError::invalid_client("Client is inactive"));
    }
    Ok(client)
}

async fn authenticate_with_secret(
    client_id: &str,
    client_secret: &str,
    method: TokenEndpointAuthMethod,
    client_storage: &dyn ClientStorage,
) -> AuthResult<AuthenticatedClient> {
    let client = find_active(client_id, client_storage).await?;

    if !client.confidential {
        return Err(AuthError::invalid_client(format!(
            "Public clients cannot use {method} authentication"
        )));
    }

    if !client_storage
        .verify_secret(client_id, client_secret)
        .await?
    {
        debug!(client_id, auth_method = %method, "Client secret mismatch");
        return Err(AuthError::invalid_client("Invalid client secret"));
    }

    Ok(AuthenticatedClient {
        client,
        auth_method: method,
    })
}

async fn authenticate_public(
    client_id: &str,
    client_storage: &dyn ClientStorage,
) -> AuthResult<AuthenticatedClient> {
    let client = find_active(client_id, client_storage).await?;

    if client.confidential {
        return Err(AuthError::invalid_client(
            "Confidential clients must provide client credentials",
        ));
    }

    Ok(AuthenticatedClient {
        client,
        auth_method: TokenEndpointAuthMethod::None,
    })
}

fn is_basic_scheme(header_value: &str) -> bool {
    header_value
        .trim_start()
        .get(..6)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("basic "))
}

/// Parses an HTTP Basic `Authorization` header value into `(client_id, client_secret)`.
///
/// Both parts are form-urlencoded before base64 encoding (RFC 6749 Section 2.3.1)
/// and are decoded here. The scheme name is matched case-insensitively. Returns
/// `None` for any other scheme, invalid base64, non-UTF-8 content, or a missing
/// `:` separator.
#[must_use]
pub fn parse_basic_auth(header_value: &str) -> Option<(String, String)> {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    let header_value = header_value.trim();
    if !is_basic_scheme(header_value) {
        return None;
    }

    let decoded = STANDARD.decode(header_value[6..].trim()).ok()?;
    let credentials = String::from_utf8(decoded).ok()?;

    // Split on first colon (secret may contain colons)
    let (client_id, client_secret) = credentials.split_once(':')?;
    if client_id.is_empty() {
        return None;
    }

    Some((form_decode(client_id)?, form_decode(client_secret)?))
}

fn form_decode(part: &str) -> Option<String> {
    urlencoding::decode(&part.replace('+', " "))
        .ok()
        .map(|decoded| decoded.into_owned())
}
