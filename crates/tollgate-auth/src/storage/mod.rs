//! Storage interfaces consumed by the token endpoint.

pub mod client;

pub use client::{ClientStorage, StaticClientRegistry};
