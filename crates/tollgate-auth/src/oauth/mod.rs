//! OAuth 2.0 token endpoint.
//!
//! A token request moves through these submodules in order:
//!
//! - [`validator`] - decode, authenticate the client, check grant types
//! - [`handler`] - grant-type specific validation
//! - [`grant`] - automatic scope grant for `client_credentials`
//! - [`builder`] - mint the token and build the response body
//! - [`endpoint`] - sequence the above into one [`TokenOutcome`]
//!
//! # Example
//!
//! ```ignore
//! use tollgate_auth::oauth::TokenEndpoint;
//!
//! let endpoint = TokenEndpoint::from_config(&config, clients)?;
//! let outcome = endpoint.process(raw_request).await;
//! let response = outcome.into_response();
//! ```

pub mod builder;
pub mod client_auth;
pub mod endpoint;
pub mod grant;
pub mod handler;
pub mod request;
pub mod session;
pub mod token;
pub mod validator;

pub use builder::{AccessResponseBuilder, DefaultAccessResponseBuilder};
pub use client_auth::{
    AuthenticatedClient, TokenEndpointAuthMethod, authenticate_client, parse_basic_auth,
};
pub use endpoint::{TokenEndpoint, TokenOutcome};
pub use grant::auto_grant_client_credentials;
pub use handler::{ClientCredentialsGrantHandler, GrantHandler, GrantHandlers};
pub use request::{AccessRequest, RawTokenRequest};
pub use session::Session;
pub use token::{TokenError, TokenErrorCode, TokenRequest, TokenResponse};
pub use validator::{AccessRequestValidator, DefaultAccessRequestValidator, ValidationFailure};
