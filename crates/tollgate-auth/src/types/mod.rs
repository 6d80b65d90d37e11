//! Domain types shared by the token endpoint modules.
//!
//! - [`Client`] - OAuth 2.0 client registration
//! - [`GrantType`] - Supported OAuth grant types
//! - [`GrantTypes`] - The grant types named by one token request

pub mod client;
pub mod grant_types;

pub use client::{Client, ClientValidationError, GrantType, UnknownGrantType};
pub use grant_types::GrantTypes;
