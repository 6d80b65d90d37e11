//! Token endpoint wire types.
//!
//! This module provides the parameter set of a token request, the success
//! body, and the error body defined by RFC 6749 Sections 5.1 and 5.2.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::AuthResult;
use crate::error::AuthError;

/// Token request parameters.
///
/// Only `grant_type` and `scope` are interpreted by the endpoint itself;
/// the remaining parameters are carried through for grant handlers.
/// Unknown parameters are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenRequest {
    /// Space-delimited OAuth 2.0 grant type(s).
    #[serde(default)]
    pub grant_type: String,

    /// Requested scope (space-delimited).
    #[serde(default)]
    pub scope: Option<String>,

    /// Client ID (for public clients or client_secret_post).
    #[serde(default)]
    pub client_id: Option<String>,

    /// Client secret (for client_secret_post authentication).
    #[serde(default)]
    pub client_secret: Option<String>,

    /// Authorization code (for authorization_code grant).
    #[serde(default)]
    pub code: Option<String>,

    /// Redirect URI (must match authorization request).
    #[serde(default)]
    pub redirect_uri: Option<String>,

    /// PKCE code verifier (for authorization_code grant).
    #[serde(default)]
    pub code_verifier: Option<String>,

    /// Refresh token (for refresh_token grant).
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Username (for password grant).
    #[serde(default)]
    pub username: Option<String>,

    /// Password (for password grant).
    #[serde(default)]
    pub password: Option<String>,
}

impl TokenRequest {
    /// Parses an `application/x-www-form-urlencoded` body.
    ///
    /// # Errors
    ///
    /// Returns `invalid_request` if a parameter appears more than once
    /// (RFC 6749 Section 3.2) or a value cannot be decoded.
    pub fn from_form(body: &[u8]) -> AuthResult<Self> {
        let mut params: HashMap<String, String> = HashMap::new();
        for (key, value) in url::form_urlencoded::parse(body) {
            if params.insert(key.to_string(), value.into_owned()).is_some() {
                return Err(AuthError::invalid_request(format!(
                    "Parameter '{key}' must not be included more than once"
                )));
            }
        }

        let object: Map<String, Value> = params
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();
        serde_json::from_value(Value::Object(object))
            .map_err(|e| AuthError::invalid_request(format!("Malformed token request: {e}")))
    }

    /// Parses an `application/json` body.
    ///
    /// # Errors
    ///
    /// Returns `invalid_request` if the body is not a JSON object of string parameters.
    pub fn from_json(body: &[u8]) -> AuthResult<Self> {
        serde_json::from_slice(body)
            .map_err(|e| AuthError::invalid_request(format!("Malformed token request: {e}")))
    }
}

/// Successful token response.
///
/// # Example Response
///
/// ```json
/// {
///   "access_token": "2YotnFZFEjr1zCsicMWpAA",
///   "token_type": "Bearer",
///   "expires_in": 3600,
///   "scope": "api.read"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    /// The access token.
    pub access_token: String,

    /// Token type, always "Bearer".
    pub token_type: String,

    /// Access token lifetime in seconds.
    pub expires_in: u64,

    /// Granted scopes (space-separated). Empty when nothing was granted.
    pub scope: String,

    /// Refresh token, if a grant handler issued one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Additional top-level fields contributed by grant handlers.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TokenResponse {
    /// Creates a new token response with required fields.
    #[must_use]
    pub fn new(access_token: String, expires_in: u64, scope: String) -> Self {
        Self {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in,
            scope,
            refresh_token: None,
            extra: Map::new(),
        }
    }
}

/// Token error response.
///
/// # Example Response
///
/// ```json
/// {
///   "error": "invalid_client",
///   "error_description": "Unknown client"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct TokenError {
    /// OAuth 2.0 error code.
    pub error: TokenErrorCode,

    /// Human-readable error description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl TokenError {
    /// Creates a new token error with description.
    #[must_use]
    pub fn with_description(error: TokenErrorCode, description: impl Into<String>) -> Self {
        Self {
            error,
            error_description: Some(description.into()),
        }
    }
}

/// Description sent for every server-side failure. Internal detail stays in the logs.
pub const SERVER_ERROR_DESCRIPTION: &str =
    "The authorization server encountered an unexpected condition";

impl From<&AuthError> for TokenError {
    fn from(error: &AuthError) -> Self {
        match error {
            AuthError::InvalidRequest { message } => {
                Self::with_description(TokenErrorCode::InvalidRequest, message.clone())
            }
            AuthError::InvalidClient { message } => {
                Self::with_description(TokenErrorCode::InvalidClient, message.clone())
            }
            AuthError::InvalidGrant { message } => {
                Self::with_description(TokenErrorCode::InvalidGrant, message.clone())
            }
            AuthError::UnauthorizedClient { message } => {
                Self::with_description(TokenErrorCode::UnauthorizedClient, message.clone())
            }
            AuthError::UnsupportedGrantType { grant_type } => Self::with_description(
                TokenErrorCode::UnsupportedGrantType,
                format!("Grant type '{grant_type}' is not supported"),
            ),
            AuthError::InvalidScope { message } => {
                Self::with_description(TokenErrorCode::InvalidScope, message.clone())
            }
            AuthError::Storage { .. }
            | AuthError::Configuration { .. }
            | AuthError::Internal { .. } => {
                Self::with_description(TokenErrorCode::ServerError, SERVER_ERROR_DESCRIPTION)
            }
        }
    }
}

/// OAuth 2.0 token error codes.
///
/// Defined in RFC 6749 Section 5.2, plus `server_error` for failures on
/// the authorization server's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenErrorCode {
    /// The request is missing a required parameter, includes an unsupported
    /// parameter value, includes a parameter more than once, or is otherwise
    /// malformed.
    InvalidRequest,

    /// Client authentication failed (unknown client, no client authentication
    /// included, or unsupported authentication method).
    InvalidClient,

    /// The provided authorization grant or refresh token is invalid, expired,
    /// revoked, or was issued to another client.
    InvalidGrant,

    /// The authenticated client is not authorized to use this authorization
    /// grant type.
    UnauthorizedClient,

    /// The authorization grant type is not supported by the authorization server.
    UnsupportedGrantType,

    /// The requested scope is invalid, unknown, malformed, or exceeds the scope
    /// granted by the resource owner.
    InvalidScope,

    /// The authorization server failed while handling the request.
    ServerError,
}

impl TokenErrorCode {
    /// Returns the string representation of the error code.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::InvalidClient => "invalid_client",
            Self::InvalidGrant => "invalid_grant",
            Self::UnauthorizedClient => "unauthorized_client",
            Self::UnsupportedGrantType => "unsupported_grant_type",
            Self::InvalidScope => "invalid_scope",
            Self::ServerError => "server_error",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidClient => 401,
            Self::ServerError => 500,
            Self::InvalidRequest
            | Self::InvalidGrant
            | Self::UnauthorizedClient
            | Self::UnsupportedGrantType
            | Self::InvalidScope => 400,
        }
    }
}

impl fmt::Display for TokenErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_request_from_form() {
        let body = b"grant_type=client_credentials&scope=api.read+api.write&client_id=c1&client_secret=s%3Dx";
        let request = TokenRequest::from_form(body).unwrap();
        assert_eq!(request.grant_type, "client_credentials");
        assert_eq!(request.scope.as_deref(), Some("api.read api.write"));
        assert_eq!(request.client_id.as_deref(), Some("c1"));
        assert_eq!(request.client_secret.as_deref(), Some("s=x"));
        assert!(request.code.is_none());
    }

    #[test]
    fn test_token_request_from_form_ignores_unknown() {
        let request = TokenRequest::from_form(b"grant_type=refresh_token&audience=x").unwrap();
        assert_eq!(request.grant_type, "refresh_token");
    }

    #[test]
    fn test_token_request_from_form_rejects_duplicates() {
        let err = TokenRequest::from_form(b"grant_type=client_credentials&scope=a&scope=b")
            .unwrap_err();
        assert_eq!(err.oauth_error_code(), "invalid_request");
        assert!(err.to_string().contains("scope"));
    }

    #[test]
    fn test_token_request_missing_grant_type_is_empty() {
        let request = TokenRequest::from_form(b"client_id=c1").unwrap();
        assert!(request.grant_type.is_empty());
    }

    #[test]
    fn test_token_request_from_json() {
        let json = br#"{
            "grant_type": "authorization_code",
            "code": "SplxlOBeZQQYbYS6WxSbIA",
            "redirect_uri": "https://app.example.com/callback",
            "client_id": "my-app"
        }"#;

        let request = TokenRequest::from_json(json).unwrap();
        assert_eq!(request.grant_type, "authorization_code");
        assert_eq!(request.code.as_deref(), Some("SplxlOBeZQQYbYS6WxSbIA"));
        assert_eq!(request.client_id.as_deref(), Some("my-app"));
        assert!(request.client_secret.is_none());
    }

    #[test]
    fn test_token_request_from_json_rejects_garbage() {
        let err = TokenRequest::from_json(b"[1,2,3]").unwrap_err();
        assert_eq!(err.oauth_error_code(), "invalid_request");
        assert!(TokenRequest::from_json(br#"{"grant_type": 5}"#).is_err());
    }

    #[test]
    fn test_token_response_serialization() {
        let response = TokenResponse::new("tok".to_string(), 3600, "api.read".to_string());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["access_token"], "tok");
        assert_eq!(json["token_type"], "Bearer");
        assert_eq!(json["expires_in"], 3600);
        assert_eq!(json["scope"], "api.read");
        assert!(json.get("refresh_token").is_none());
    }

    #[test]
    fn test_token_response_empty_scope_is_sent() {
        let response = TokenResponse::new("tok".to_string(), 60, String::new());
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["scope"], "");
    }

    #[test]
    fn test_token_response_extra_fields_flattened() {
        let mut response = TokenResponse::new("tok".to_string(), 60, String::new());
        response.refresh_token = Some("rt".to_string());
        response
            .extra
            .insert("issued_token_type".to_string(), Value::String("urn:x".to_string()));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["refresh_token"], "rt");
        assert_eq!(json["issued_token_type"], "urn:x");
    }

    #[test]
    fn test_token_error_serialization() {
        let error = TokenError::from(&AuthError::internal("key missing"));

        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains(r#""error":"server_error""#));
        assert!(!json.contains("key missing"));
    }

    #[test]
    fn test_token_error_from_auth_error() {
        let error = TokenError::from(&AuthError::invalid_client("Unknown client"));
        assert_eq!(error.error, TokenErrorCode::InvalidClient);
        assert_eq!(error.error_description.as_deref(), Some("Unknown client"));

        let error = TokenError::from(&AuthError::unsupported_grant_type("password"));
        assert_eq!(error.error, TokenErrorCode::UnsupportedGrantType);
        assert_eq!(
            error.error_description.as_deref(),
            Some("Grant type 'password' is not supported")
        );
    }

    #[test]
    fn test_server_errors_do_not_leak_detail() {
        let error = TokenError::from(&AuthError::storage("connection to 10.0.0.5:5432 refused"));
        assert_eq!(error.error, TokenErrorCode::ServerError);
        assert_eq!(
            error.error_description.as_deref(),
            Some(SERVER_ERROR_DESCRIPTION)
        );
    }

    #[test]
    fn test_error_code_http_status() {
        assert_eq!(TokenErrorCode::InvalidRequest.http_status(), 400);
        assert_eq!(TokenErrorCode::InvalidClient.http_status(), 401);
        assert_eq!(TokenErrorCode::InvalidGrant.http_status(), 400);
        assert_eq!(TokenErrorCode::UnsupportedGrantType.http_status(), 400);
        assert_eq!(TokenErrorCode::ServerError.http_status(), 500);
    }

    #[test]
    fn test_error_code_matches_auth_error_code() {
        for err in [
            AuthError::invalid_request("x"),
            AuthError::invalid_client("x"),
            AuthError::invalid_grant("x"),
            AuthError::unauthorized_client("x"),
            AuthError::unsupported_grant_type("x"),
            AuthError::invalid_scope("x"),
            AuthError::internal("x"),
        ] {
            assert_eq!(TokenError::from(&err).error.as_str(), err.oauth_error_code());
        }
    }
}
