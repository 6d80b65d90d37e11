//! Token response construction.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::AuthResult;
use crate::error::AuthError;
use crate::oauth::handler::GrantHandlers;
use crate::oauth::request::AccessRequest;
use crate::oauth::session::Session;
use crate::oauth::token::TokenResponse;
use crate::token::AccessTokenStrategy;

/// Turns a validated, scope-resolved request into a token response.
#[async_trait]
pub trait AccessResponseBuilder: Send + Sync {
    /// Builds the response for `request`.
    ///
    /// # Errors
    ///
    /// Returns an `AuthError` if no token can be issued.
    async fn build(&self, request: &AccessRequest, session: &Session) -> AuthResult<TokenResponse>;
}

/// Mints the token through an [`AccessTokenStrategy`] and lets the grant
/// handlers add their fields.
#[derive(Clone)]
pub struct DefaultAccessResponseBuilder {
    strategy: Arc<dyn AccessTokenStrategy>,
    handlers: GrantHandlers,
    default_lifetime: Duration,
}

impl DefaultAccessResponseBuilder {
    /// `default_lifetime` applies unless a grant handler set a session override.
    #[must_use]
    pub fn new(
        strategy: Arc<dyn AccessTokenStrategy>,
        handlers: GrantHandlers,
        default_lifetime: Duration,
    ) -> Self {
        Self {
            strategy,
            handlers,
            default_lifetime,
        }
    }
}

impl std::fmt::Debug for DefaultAccessResponseBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultAccessResponseBuilder")
            .field("handlers", &self.handlers)
            .field("default_lifetime", &self.default_lifetime)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AccessResponseBuilder for DefaultAccessResponseBuilder {
    async fn build(&self, request: &AccessRequest, session: &Session) -> AuthResult<TokenResponse> {
        let handlers: Vec<_> = self.handlers.matching(request.grant_types()).collect();
        if handlers.is_empty() {
            return Err(AuthError::internal(format!(
                "No grant handler accepted grant type '{}'",
                request.grant_types()
            )));
        }

        let lifetime = session.access_token_lifetime.unwrap_or(self.default_lifetime);
        let access_token = self.strategy.generate(request, session, lifetime)?;

        let mut response = TokenResponse::new(
            access_token,
            lifetime.as_secs(),
            request.granted_scopes().to_string(),
        );
        for handler in handlers {
            handler
                .populate_token_response(request, session, &mut response)
                .await?;
        }

        Ok(response)
    }
}
