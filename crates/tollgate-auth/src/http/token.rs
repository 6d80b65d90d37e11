//! OAuth 2.0 Token endpoint handler.
//!
//! # Example
//!
//! ```ignore
//! POST /oauth2/token
//! Content-Type: application/x-www-form-urlencoded
//! Authorization: Basic <base64(client_id:client_secret)>
//!
//! grant_type=client_credentials
//! &scope=api.read
//! ```

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{State, rejection::BytesRejection},
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::error::AuthError;
use crate::oauth::endpoint::{TokenEndpoint, TokenOutcome};
use crate::oauth::request::{AccessRequest, RawTokenRequest};
use crate::oauth::token::{TokenError, TokenResponse};

/// `WWW-Authenticate` challenge sent with `invalid_client` responses.
pub const CLIENT_AUTH_CHALLENGE: &str = "Basic realm=\"tollgate\"";

/// State required for the token endpoint.
#[derive(Clone)]
pub struct TokenState {
    endpoint: Arc<TokenEndpoint>,
}

impl TokenState {
    /// Creates a new token state.
    #[must_use]
    pub fn new(endpoint: Arc<TokenEndpoint>) -> Self {
        Self { endpoint }
    }
}

/// OAuth 2.0 token endpoint handler.
///
/// Accepts any method so that non-POST requests get an OAuth error body
/// instead of a bare 405. A body that cannot be buffered (over the size limit
/// or cut off) is answered with `invalid_request`.
pub async fn token_handler(
    State(state): State<TokenState>,
    method: Method,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!(
                error = %rejection,
                status = rejection.status().as_u16(),
                "Token request body rejected"
            );
            return write_access_error(
                None,
                &AuthError::invalid_request(format!("Request body could not be read: {rejection}")),
            );
        }
    };

    state
        .endpoint
        .process(RawTokenRequest::new(method, headers, body))
        .await
        .into_response()
}

impl IntoResponse for TokenOutcome {
    fn into_response(self) -> Response {
        match self {
            Self::Issued { request, response } => write_access_response(&request, response),
            Self::ValidationFailed { request, error } => {
                write_access_error(request.as_ref(), &error)
            }
            Self::ResponseFailed { request, error } => write_access_error(Some(&request), &error),
        }
    }
}

/// Writes a successful token response.
pub fn write_access_response(request: &AccessRequest, response: TokenResponse) -> Response {
    debug!(
        client_id = %request.client().client_id,
        access_request_id = %request.id(),
        "Writing token response"
    );

    (
        StatusCode::OK,
        [
            (header::CACHE_CONTROL, "no-store"),
            (header::PRAGMA, "no-cache"),
        ],
        Json(response),
    )
        .into_response()
}

/// Writes a token error response.
///
/// Server-class errors are reported as `server_error` with a fixed
/// description.
pub fn write_access_error(request: Option<&AccessRequest>, error: &AuthError) -> Response {
    let body = TokenError::from(error);
    let status = StatusCode::from_u16(body.error.http_status())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    debug!(
        client_id = request.map(|r| r.client().client_id.as_str()),
        error = %body.error,
        status = status.as_u16(),
        "Writing token error response"
    );

    let mut response = (
        status,
        [
            (header::CACHE_CONTROL, "no-store"),
            (header::PRAGMA, "no-cache"),
        ],
        Json(body),
    )
        .into_response();

    if status == StatusCode::UNAUTHORIZED {
        response.headers_mut().insert(
            header::WWW_AUTHENTICATE,
            HeaderValue::from_static(CLIENT_AUTH_CHALLENGE),
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::request::tests::{access_request, service_client};
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn assert_no_cache(response: &Response) {
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
        assert_eq!(response.headers()[header::PRAGMA], "no-cache");
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
    }

    #[tokio::test]
    async fn test_success_response() {
        let request = access_request("client_credentials", "api.read", service_client(&["api"]));
        let response = write_access_response(
            &request,
            TokenResponse::new("tok".to_string(), 3600, "api.read".to_string()),
        );

        assert_eq!(response.status(), StatusCode::OK);
        assert_no_cache(&response);
        let body = json_body(response).await;
        assert_eq!(body["access_token"], "tok");
        assert_eq!(body["token_type"], "Bearer");
        assert_eq!(body["scope"], "api.read");
    }

    #[tokio::test]
    async fn test_invalid_client_is_401_with_challenge() {
        let response = write_access_error(None, &AuthError::invalid_client("Unknown client"));

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_no_cache(&response);
        assert_eq!(
            response.headers()[header::WWW_AUTHENTICATE],
            "Basic realm=\"tollgate\""
        );
        let body = json_body(response).await;
        assert_eq!(body["error"], "invalid_client");
        assert_eq!(body["error_description"], "Unknown client");
    }

    #[tokio::test]
    async fn test_client_errors_are_400() {
        let request = access_request("client_credentials", "", service_client(&[]));
        let response = write_access_error(
            Some(&request),
            &AuthError::unauthorized_client("Client is not allowed to use the password grant"),
        );

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
        let body = json_body(response).await;
        assert_eq!(body["error"], "unauthorized_client");
    }

    #[tokio::test]
    async fn test_server_error_hides_detail() {
        let response = write_access_error(None, &AuthError::storage("pg: connection refused"));

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["error"], "server_error");
        assert!(
            !body["error_description"]
                .as_str()
                .unwrap()
                .contains("connection refused")
        );
    }

    #[tokio::test]
    async fn test_outcome_writes_one_response() {
        let request = access_request("client_credentials", "", service_client(&[]));
        let outcome = TokenOutcome::ResponseFailed {
            request,
            error: AuthError::internal("signing failed"),
        };
        let response = outcome.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let outcome = TokenOutcome::ValidationFailed {
            request: None,
            error: AuthError::invalid_request("Missing grant_type parameter"),
        };
        let body = json_body(outcome.into_response()).await;
        assert_eq!(body["error"], "invalid_request");
        assert!(body.get("access_token").is_none());
    }
}
