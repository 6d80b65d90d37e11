//! Token endpoint orchestration.
//!
//! [`TokenEndpoint::process`] drives a request through validation, scope
//! auto-grant, and response building, and returns a single [`TokenOutcome`].
//! Turning that outcome into an HTTP response writes exactly one body (see
//! [`crate::http`]).

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::{AuthConfig, ConfigError};
use crate::error::AuthError;
use crate::oauth::builder::{AccessResponseBuilder, DefaultAccessResponseBuilder};
use crate::oauth::grant::auto_grant_client_credentials;
use crate::oauth::handler::GrantHandlers;
use crate::oauth::request::{AccessRequest, RawTokenRequest};
use crate::oauth::session::Session;
use crate::oauth::token::TokenResponse;
use crate::oauth::validator::{AccessRequestValidator, DefaultAccessRequestValidator, ValidationFailure};
use crate::scope::{HierarchicScopeStrategy, ScopeStrategy};
use crate::storage::ClientStorage;
use crate::token::strategy_from_config;

/// Terminal state of one token request.
#[derive(Debug)]
pub enum TokenOutcome {
    /// A token was issued.
    Issued {
        request: AccessRequest,
        response: TokenResponse,
    },
    /// The request was rejected before any token was built.
    ValidationFailed {
        request: Option<AccessRequest>,
        error: AuthError,
    },
    /// The request was valid but no token could be built.
    ResponseFailed {
        request: AccessRequest,
        error: AuthError,
    },
}

impl TokenOutcome {
    /// Returns the error for failed outcomes.
    #[must_use]
    pub fn error(&self) -> Option<&AuthError> {
        match self {
            Self::Issued { .. } => None,
            Self::ValidationFailed { error, .. } | Self::ResponseFailed { error, .. } => {
                Some(error)
            }
        }
    }

    /// Returns the access request, if validation got far enough to produce one.
    #[must_use]
    pub fn request(&self) -> Option<&AccessRequest> {
        match self {
            Self::Issued { request, .. } | Self::ResponseFailed { request, .. } => Some(request),
            Self::ValidationFailed { request, .. } => request.as_ref(),
        }
    }
}

/// The token endpoint.
///
/// Holds only shared collaborators, so one instance serves every request.
#[derive(Clone)]
pub struct TokenEndpoint {
    validator: Arc<dyn AccessRequestValidator>,
    builder: Arc<dyn AccessResponseBuilder>,
    scope_strategy: Arc<dyn ScopeStrategy>,
}

impl TokenEndpoint {
    /// Creates an endpoint from its collaborators.
    #[must_use]
    pub fn new(
        validator: Arc<dyn AccessRequestValidator>,
        builder: Arc<dyn AccessResponseBuilder>,
        scope_strategy: Arc<dyn ScopeStrategy>,
    ) -> Self {
        Self {
            validator,
            builder,
            scope_strategy,
        }
    }

    /// Wires the default validator, builder, and hierarchic scope matching.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configured token format cannot be set up.
    pub fn from_config(config: &AuthConfig, clients: Arc<dyn ClientStorage>) -> Result<Self, ConfigError> {
        let handlers = GrantHandlers::with_defaults();
        let validator = DefaultAccessRequestValidator::new(clients, &config.oauth, handlers.clone());
        let builder = DefaultAccessResponseBuilder::new(
            strategy_from_config(config)?,
            handlers,
            config.oauth.access_token_lifetime,
        );

        Ok(Self::new(
            Arc::new(validator),
            Arc::new(builder),
            Arc::new(HierarchicScopeStrategy),
        ))
    }

    /// Processes one token request.
    pub async fn process(&self, raw: RawTokenRequest) -> TokenOutcome {
        let mut session = Session::new();
        debug!(request_id = %session.request_id, method = %raw.method, "Token request received");

        let mut request = match self.validator.validate(&raw, &mut session).await {
            Ok(request) => request,
            Err(ValidationFailure { request, error }) => {
                log_failure(&session, request.as_ref(), &error, "Token request rejected");
                return TokenOutcome::ValidationFailed { request, error };
            }
        };

        auto_grant_client_credentials(&mut request, self.scope_strategy.as_ref());

        match self.builder.build(&request, &session).await {
            Ok(response) => {
                info!(
                    request_id = %session.request_id,
                    client_id = %request.client().client_id,
                    grant_type = %request.grant_types(),
                    scope = %request.granted_scopes(),
                    expires_in = response.expires_in,
                    "Access token issued"
                );
                TokenOutcome::Issued { request, response }
            }
            Err(error) => {
                log_failure(&session, Some(&request), &error, "Token response failed");
                TokenOutcome::ResponseFailed { request, error }
            }
        }
    }
}

impl std::fmt::Debug for TokenEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenEndpoint").finish_non_exhaustive()
    }
}

fn log_failure(session: &Session, request: Option<&AccessRequest>, err: &AuthError, message: &str) {
    let client_id = request.map(|r| r.client().client_id.as_str()).unwrap_or("-");
    if err.is_server_error() {
        error!(
            request_id = %session.request_id,
            client_id,
            category = %err.category(),
            error = %err,
            "{message}"
        );
    } else {
        warn!(
            request_id = %session.request_id,
            client_id,
            category = %err.category(),
            error = %err,
            "{message}"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AuthResult;
    use crate::oauth::request::tests::{access_request, service_client};
    use async_trait::async_trait;
    use axum::http::{HeaderMap, Method};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubValidator {
        grants: &'static str,
        scope: &'static str,
        fail_with: Option<fn() -> ValidationFailure>,
    }

    #[async_trait]
    impl AccessRequestValidator for StubValidator {
        async fn validate(
            &self,
            _raw: &RawTokenRequest,
            session: &mut Session,
        ) -> Result<AccessRequest, ValidationFailure> {
            if let Some(fail) = self.fail_with {
                return Err(fail());
            }
            session.subject = Some("c1".to_string());
            Ok(access_request(
                self.grants,
                self.scope,
                service_client(&["api.read", "api.write"]),
            ))
        }
    }

    #[derive(Default)]
    struct CountingBuilder {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl AccessResponseBuilder for CountingBuilder {
        async fn build(&self, request: &AccessRequest, session: &Session) -> AuthResult<TokenResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(session.subject.as_deref(), Some("c1"));
            if self.fail {
                return Err(AuthError::storage("token store unreachable"));
            }
            Ok(TokenResponse::new(
                "tok".to_string(),
                60,
                request.granted_scopes().to_string(),
            ))
        }
    }

    fn endpoint(validator: StubValidator, builder: Arc<CountingBuilder>) -> TokenEndpoint {
        TokenEndpoint::new(
            Arc::new(validator),
            builder,
            Arc::new(HierarchicScopeStrategy),
        )
    }

    fn raw() -> RawTokenRequest {
        RawTokenRequest::new(Method::POST, HeaderMap::new(), "")
    }

    #[tokio::test]
    async fn test_issued_with_auto_granted_scope() {
        let builder = Arc::new(CountingBuilder::default());
        let validator = StubValidator {
            grants: "client_credentials",
            scope: "api.read api.admin",
            fail_with: None,
        };

        let outcome = endpoint(validator, builder.clone()).process(raw()).await;
        match outcome {
            TokenOutcome::Issued { request, response } => {
                assert_eq!(request.granted_scopes().to_string(), "api.read");
                assert_eq!(response.scope, "api.read");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(builder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_other_grant_type_gets_no_auto_grant() {
        let builder = Arc::new(CountingBuilder::default());
        let validator = StubValidator {
            grants: "authorization_code",
            scope: "api.read",
            fail_with: None,
        };

        let outcome = endpoint(validator, builder).process(raw()).await;
        let request = outcome.request().unwrap();
        assert!(request.granted_scopes().is_empty());
        assert!(outcome.error().is_none());
    }

    #[tokio::test]
    async fn test_validation_failure_skips_builder() {
        let builder = Arc::new(CountingBuilder::default());
        let validator = StubValidator {
            grants: "client_credentials",
            scope: "",
            fail_with: Some(|| ValidationFailure::new(AuthError::invalid_client("Unknown client"))),
        };

        let outcome = endpoint(validator, builder.clone()).process(raw()).await;
        assert!(matches!(
            outcome,
            TokenOutcome::ValidationFailed { request: None, .. }
        ));
        assert_eq!(outcome.error().unwrap().oauth_error_code(), "invalid_client");
        assert_eq!(builder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_validation_failure_keeps_partial_request() {
        let builder = Arc::new(CountingBuilder::default());
        let validator = StubValidator {
            grants: "client_credentials",
            scope: "",
            fail_with: Some(|| {
                ValidationFailure::with_request(
                    access_request("client_credentials", "", service_client(&[])),
                    AuthError::unauthorized_client("nope"),
                )
            }),
        };

        let outcome = endpoint(validator, builder).process(raw()).await;
        assert!(matches!(
            outcome,
            TokenOutcome::ValidationFailed { request: Some(_), .. }
        ));
    }

    #[tokio::test]
    async fn test_builder_failure() {
        let builder = Arc::new(CountingBuilder {
            fail: true,
            ..Default::default()
        });
        let validator = StubValidator {
            grants: "client_credentials",
            scope: "api.read",
            fail_with: None,
        };

        let outcome = endpoint(validator, builder.clone()).process(raw()).await;
        match &outcome {
            TokenOutcome::ResponseFailed { request, error } => {
                assert!(error.is_server_error());
                assert_eq!(request.granted_scopes().to_string(), "api.read");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(builder.calls.load(Ordering::SeqCst), 1);
    }
}
