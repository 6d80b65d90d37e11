//! Grant type handlers.
//!
//! Each [`GrantHandler`] owns one grant type. The validator runs
//! [`GrantHandler::handle_token_request`] for every handler whose grant type was
//! requested; the response builder later runs
//! [`GrantHandler::populate_token_response`] on the same handlers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::AuthResult;
use crate::error::AuthError;
use crate::oauth::request::AccessRequest;
use crate::oauth::session::Session;
use crate::oauth::token::TokenResponse;
use crate::types::{GrantType, GrantTypes};

/// Handler for one OAuth 2.0 grant type.
#[async_trait]
pub trait GrantHandler: Send + Sync {
    /// The grant type this handler serves.
    fn grant_type(&self) -> GrantType;

    /// Validates grant-specific parameters and records identity on the session.
    ///
    /// # Errors
    ///
    /// Returns a client-class `AuthError` if the request cannot be honoured.
    async fn handle_token_request(
        &self,
        request: &mut AccessRequest,
        session: &mut Session,
    ) -> AuthResult<()>;

    /// Adds grant-specific fields to an already minted token response.
    ///
    /// # Errors
    ///
    /// Returns an error if the extra fields cannot be produced.
    async fn populate_token_response(
        &self,
        _request: &AccessRequest,
        _session: &Session,
        _response: &mut TokenResponse,
    ) -> AuthResult<()> {
        Ok(())
    }
}

/// Ordered set of registered grant handlers, shared by validator and builder.
#[derive(Clone)]
pub struct GrantHandlers {
    handlers: Arc<[Arc<dyn GrantHandler>]>,
}

impl GrantHandlers {
    /// Registers `handlers` in order.
    #[must_use]
    pub fn new(handlers: Vec<Arc<dyn GrantHandler>>) -> Self {
        Self {
            handlers: handlers.into(),
        }
    }

    /// Handlers for the grant types shipped with this crate.
    #[must_use]
    pub fn with_defaults() -> Self {
        let client_credentials: Arc<dyn GrantHandler> = Arc::new(ClientCredentialsGrantHandler);
        Self::new(vec![client_credentials])
    }

    /// Returns `true` if some handler serves `grant`.
    #[must_use]
    pub fn supports(&self, grant: GrantType) -> bool {
        self.handlers.iter().any(|h| h.grant_type() == grant)
    }

    /// Handlers whose grant type is one of `grant_types`, in registration order.
    pub fn matching<'a>(
        &'a self,
        grant_types: &'a GrantTypes,
    ) -> impl Iterator<Item = &'a Arc<dyn GrantHandler>> + 'a {
        self.handlers
            .iter()
            .filter(move |h| grant_types.contains(h.grant_type()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for GrantHandlers {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl std::fmt::Debug for GrantHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.handlers.iter().map(|h| h.grant_type()))
            .finish()
    }
}

/// `client_credentials` grant (RFC 6749 Section 4.4).
///
/// The client is the resource owner: the session subject is the client id.
/// Scope granting is left to the auto-grant policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientCredentialsGrantHandler;

#[async_trait]
impl GrantHandler for ClientCredentialsGrantHandler {
    fn grant_type(&self) -> GrantType {
        GrantType::ClientCredentials
    }

    async fn handle_token_request(
        &self,
        request: &mut AccessRequest,
        session: &mut Session,
    ) -> AuthResult<()> {
        let client = request.client();

        if !client.confidential {
            return Err(AuthError::invalid_client(
                "Public clients cannot use the client_credentials grant",
            ));
        }

        session.subject = Some(client.client_id.clone());
        if let Some(secs) = client.access_token_lifetime {
            session.access_token_lifetime = u64::try_from(secs).ok().map(Duration::from_secs);
        }
        Ok(())
    }
}
