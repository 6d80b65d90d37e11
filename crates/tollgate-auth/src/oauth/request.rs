//! Token request representations.
//!
//! [`RawTokenRequest`] is what the transport hands to the endpoint;
//! [`AccessRequest`] is what a validator produces from it.

use std::sync::Arc;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, header};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::oauth::client_auth::TokenEndpointAuthMethod;
use crate::oauth::token::TokenRequest;
use crate::scope::Scopes;
use crate::types::{Client, GrantTypes};

/// An undecoded token request as received by the transport.
#[derive(Debug, Clone)]
pub struct RawTokenRequest {
    /// HTTP method.
    pub method: Method,
    /// Request headers.
    pub headers: HeaderMap,
    /// Request body.
    pub body: Bytes,
}

impl RawTokenRequest {
    /// Creates a raw request.
    #[must_use]
    pub fn new(method: Method, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            method,
            headers,
            body: body.into(),
        }
    }

    /// Media type of the body without parameters, lowercased.
    #[must_use]
    pub fn media_type(&self) -> Option<String> {
        let value = self.headers.get(header::CONTENT_TYPE)?.to_str().ok()?;
        let essence = value.split(';').next().unwrap_or_default().trim();
        Some(essence.to_ascii_lowercase())
    }

    /// Value of the `Authorization` header, if present and readable.
    #[must_use]
    pub fn authorization(&self) -> Option<&str> {
        self.headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
    }
}

/// A validated token request.
///
/// Grant types and requested scopes are fixed at construction. The only
/// mutation is [`grant_scope`](Self::grant_scope), which can only grant
/// scopes that were requested.
#[derive(Debug, Clone)]
pub struct AccessRequest {
    id: Uuid,
    requested_at: OffsetDateTime,
    grant_types: GrantTypes,
    requested_scopes: Scopes,
    granted_scopes: Scopes,
    client: Arc<Client>,
    params: TokenRequest,
    auth_method: TokenEndpointAuthMethod,
}

impl AccessRequest {
    /// Creates an access request with nothing granted yet.
    #[must_use]
    pub fn new(
        client: Arc<Client>,
        grant_types: GrantTypes,
        requested_scopes: Scopes,
        params: TokenRequest,
        auth_method: TokenEndpointAuthMethod,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            requested_at: OffsetDateTime::now_utc(),
            grant_types,
            requested_scopes,
            granted_scopes: Scopes::new(),
            client,
            params,
            auth_method,
        }
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn requested_at(&self) -> OffsetDateTime {
        self.requested_at
    }

    #[must_use]
    pub fn grant_types(&self) -> &GrantTypes {
        &self.grant_types
    }

    #[must_use]
    pub fn requested_scopes(&self) -> &Scopes {
        &self.requested_scopes
    }

    #[must_use]
    pub fn granted_scopes(&self) -> &Scopes {
        &self.granted_scopes
    }

    #[must_use]
    pub fn client(&self) -> &Arc<Client> {
        &self.client
    }

    /// The decoded request parameters.
    #[must_use]
    pub fn params(&self) -> &TokenRequest {
        &self.params
    }

    /// How the client authenticated.
    #[must_use]
    pub fn auth_method(&self) -> TokenEndpointAuthMethod {
        self.auth_method
    }

    /// Grants `scope` if it was requested.
    ///
    /// Returns `false` if the scope was not requested or is already granted.
    pub fn grant_scope(&mut self, scope: &str) -> bool {
        self.requested_scopes.contains(scope) && self.granted_scopes.push(scope)
    }

    /// Grants every requested scope accepted by `predicate`, in requested order.
    pub fn grant_requested_where(&mut self, mut predicate: impl FnMut(&str) -> bool) {
        for scope in self.requested_scopes.iter() {
            if predicate(scope) {
                self.granted_scopes.push(scope);
            }
        }
    }
}
