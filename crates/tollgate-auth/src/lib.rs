//! # tollgate-auth
//!
//! The token endpoint of an OAuth 2.0 authorization server.
//!
//! This crate provides:
//! - Hierarchical scope matching
//! - Automatic scope grant for the `client_credentials` flow
//! - Token request validation and client authentication
//! - Opaque and JWT access token minting
//! - An axum handler that writes exactly one response per request
//!
//! ## Modules
//!
//! - [`scope`] - Scope matching strategies and the ordered scope list
//! - [`oauth`] - Token endpoint orchestration and its collaborators
//! - [`token`] - Access token strategies
//! - [`storage`] - Client registry
//! - [`config`] - Token endpoint configuration
//! - [`http`] - Axum handler for the token endpoint

pub mod config;
pub mod error;
pub mod http;
pub mod oauth;
pub mod scope;
pub mod secret;
pub mod storage;
pub mod token;
pub mod types;

pub use config::{AuthConfig, ConfigError, OAuthConfig, SigningConfig, TokenFormat};
pub use error::{AuthError, ErrorCategory};
pub use http::{TokenState, token_handler, write_access_error, write_access_response};
pub use oauth::{
    AccessRequest, AccessRequestValidator, AccessResponseBuilder, RawTokenRequest, Session,
    TokenEndpoint, TokenOutcome, TokenResponse, ValidationFailure,
};
pub use scope::{
    ExactScopeStrategy, HierarchicScopeStrategy, ScopeStrategy, Scopes, hierarchic_scope_matches,
};
pub use storage::{ClientStorage, StaticClientRegistry};
pub use types::{Client, ClientValidationError, GrantType, GrantTypes};

/// Type alias for token endpoint results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use tollgate_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::config::{AuthConfig, ConfigError};
    pub use crate::error::{AuthError, ErrorCategory};
    pub use crate::http::{TokenState, token_handler};
    pub use crate::oauth::{
        AccessRequest, AccessRequestValidator, AccessResponseBuilder, GrantHandler, Session,
        TokenEndpoint, TokenOutcome,
    };
    pub use crate::scope::{ScopeStrategy, Scopes};
    pub use crate::storage::{ClientStorage, StaticClientRegistry};
    pub use crate::types::{Client, GrantType, GrantTypes};
}
