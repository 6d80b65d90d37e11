//! HTTP surface of the token endpoint.
//!
//! # Available Handlers
//!
//! - [`token`] - Token endpoint (RFC 6749 Section 3.2)

pub mod token;

pub use token::{TokenState, token_handler, write_access_error, write_access_response};
