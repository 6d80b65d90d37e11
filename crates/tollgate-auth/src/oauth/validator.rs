//! Token request validation.
//!
//! An [`AccessRequestValidator`] turns a [`RawTokenRequest`] into a typed
//! [`AccessRequest`]: it decodes the body, authenticates the client, checks the
//! requested grant types against server and client configuration, and lets the
//! grant handlers inspect the request.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::Method;
use tracing::debug;

use crate::config::OAuthConfig;
use crate::error::AuthError;
use crate::oauth::client_auth::authenticate_client;
use crate::oauth::handler::GrantHandlers;
use crate::oauth::request::{AccessRequest, RawTokenRequest};
use crate::oauth::session::Session;
use crate::oauth::token::TokenRequest;
use crate::scope::Scopes;
use crate::storage::ClientStorage;
use crate::types::{GrantType, GrantTypes};

const FORM_MEDIA_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_MEDIA_TYPE: &str = "application/json";

/// A failed validation.
///
/// `request` carries whatever was validated before the failure, so the error
/// writer can still see which client and grant types were involved. It is
/// `None` when the failure happened before the client was identified.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct ValidationFailure {
    /// Partially validated request, if validation got far enough.
    pub request: Option<AccessRequest>,
    /// Why validation failed.
    pub error: AuthError,
}

impl ValidationFailure {
    /// A failure with no request context.
    #[must_use]
    pub fn new(error: AuthError) -> Self {
        Self {
            request: None,
            error,
        }
    }

    /// A failure attached to a partially validated request.
    #[must_use]
    pub fn with_request(request: AccessRequest, error: AuthError) -> Self {
        Self {
            request: Some(request),
            error,
        }
    }
}

impl From<AuthError> for ValidationFailure {
    fn from(error: AuthError) -> Self {
        Self::new(error)
    }
}

/// Turns raw token requests into validated access requests.
#[async_trait]
pub trait AccessRequestValidator: Send + Sync {
    /// Validates `raw`, recording identity on `session`.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationFailure`] describing the first problem found.
    async fn validate(
        &self,
        raw: &RawTokenRequest,
        session: &mut Session,
    ) -> Result<AccessRequest, ValidationFailure>;
}

/// Validator backed by a [`ClientStorage`] and the registered grant handlers.
#[derive(Clone)]
pub struct DefaultAccessRequestValidator {
    clients: Arc<dyn ClientStorage>,
    oauth: OAuthConfig,
    handlers: GrantHandlers,
}

impl DefaultAccessRequestValidator {
    /// Creates a validator accepting the grant types enabled in `oauth`.
    #[must_use]
    pub fn new(clients: Arc<dyn ClientStorage>, oauth: &OAuthConfig, handlers: GrantHandlers) -> Self {
        Self {
            clients,
            oauth: oauth.clone(),
            handlers,
        }
    }

    fn decode_body(raw: &RawTokenRequest) -> Result<TokenRequest, AuthError> {
        match raw.media_type().as_deref() {
            None | Some(FORM_MEDIA_TYPE) => TokenRequest::from_form(&raw.body),
            Some(JSON_MEDIA_TYPE) => TokenRequest::from_json(&raw.body),
            Some(other) => Err(AuthError::invalid_request(format!(
                "Unsupported content type '{other}'"
            ))),
        }
    }

    fn check_grant_type(&self, grant: GrantType, request: &AccessRequest) -> Result<(), AuthError> {
        if !self.oauth.is_grant_type_enabled(grant) || !self.handlers.supports(grant) {
            return Err(AuthError::unsupported_grant_type(grant.as_str()));
        }
        if !request.client().is_grant_type_allowed(grant) {
            return Err(AuthError::unauthorized_client(format!(
                "Client is not allowed to use the {grant} grant"
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for DefaultAccessRequestValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultAccessRequestValidator")
            .field("grant_types", &self.oauth.grant_types)
            .field("handlers", &self.handlers)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AccessRequestValidator for DefaultAccessRequestValidator {
    async fn validate(
        &self,
        raw: &RawTokenRequest,
        session: &mut Session,
    ) -> Result<AccessRequest, ValidationFailure> {
        if raw.method != Method::POST {
            return Err(AuthError::invalid_request(format!(
                "Token requests must use POST, got {}",
                raw.method
            ))
            .into());
        }

        let params = Self::decode_body(raw)?;
        let grant_types = GrantTypes::parse(&params.grant_type)?;

        let authenticated =
            authenticate_client(&params, raw.authorization(), self.clients.as_ref()).await?;
        session.client_id = Some(authenticated.client.client_id.clone());

        let requested_scopes = Scopes::parse(params.scope.as_deref().unwrap_or_default());
        let mut request = AccessRequest::new(
            authenticated.client,
            grant_types.clone(),
            requested_scopes,
            params,
            authenticated.auth_method,
        );

        for grant in grant_types.iter() {
            if let Err(error) = self.check_grant_type(grant, &request) {
                return Err(ValidationFailure::with_request(request, error));
            }
        }

        for handler in self.handlers.matching(&grant_types) {
            let handled = handler.handle_token_request(&mut request, session).await;
            if let Err(error) = handled {
                return Err(ValidationFailure::with_request(request, error));
            }
        }

        debug!(
            request_id = %session.request_id,
            client_id = %request.client().client_id,
            grant_type = %grant_types,
            auth_method = %request.auth_method(),
            "Token request validated"
        );

        Ok(request)
    }
}
