//! Token endpoint error types.
//!
//! Every failure the token endpoint can produce is an [`AuthError`]. Errors are
//! classified twice: into an [`ErrorCategory`] for logging, and into an OAuth 2.0
//! error code (RFC 6749 Section 5.2) for the client-facing response body.

use std::fmt;

/// A terminal failure of a single token request.
///
/// The first six variants are the client-facing codes of RFC 6749 Section 5.2.
/// The last three are server-side faults and are reported as `server_error`.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Missing, repeated or malformed request parameter.
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Client authentication failed.
    #[error("Invalid client: {message}")]
    InvalidClient { message: String },

    /// The presented grant is invalid, expired or revoked.
    #[error("Invalid grant: {message}")]
    InvalidGrant { message: String },

    /// The client is registered but may not use the requested grant type.
    #[error("Unauthorized client: {message}")]
    UnauthorizedClient { message: String },

    /// The grant type is unknown, disabled, or has no handler.
    #[error("Unsupported grant type: {grant_type}")]
    UnsupportedGrantType { grant_type: String },

    #[error("Invalid scope: {message}")]
    InvalidScope { message: String },

    /// Client lookup or secret verification failed.
    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Token minting or response assembly failed.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AuthError {
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid_client(message: impl Into<String>) -> Self {
        Self::InvalidClient {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid_grant(message: impl Into<String>) -> Self {
        Self::InvalidGrant {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn unauthorized_client(message: impl Into<String>) -> Self {
        Self::UnauthorizedClient {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn unsupported_grant_type(grant_type: impl Into<String>) -> Self {
        Self::UnsupportedGrantType {
            grant_type: grant_type.into(),
        }
    }

    #[must_use]
    pub fn invalid_scope(message: impl Into<String>) -> Self {
        Self::InvalidScope {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` for faults on the server side.
    ///
    /// These are logged at `error` and their detail never reaches the client.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Storage { .. } | Self::Configuration { .. } | Self::Internal { .. }
        )
    }

    /// Returns the error category used in log fields.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidClient { .. } | Self::InvalidGrant { .. } => ErrorCategory::Authentication,
            Self::UnauthorizedClient { .. } | Self::InvalidScope { .. } => {
                ErrorCategory::Authorization
            }
            Self::InvalidRequest { .. } | Self::UnsupportedGrantType { .. } => {
                ErrorCategory::Validation
            }
            Self::Internal { .. } => ErrorCategory::Issuance,
            Self::Storage { .. } => ErrorCategory::Infrastructure,
            Self::Configuration { .. } => ErrorCategory::Configuration,
        }
    }

    /// Returns the RFC 6749 error code sent to the client.
    #[must_use]
    pub fn oauth_error_code(&self) -> &'static str {
        match self {
            Self::InvalidRequest { .. } => "invalid_request",
            Self::InvalidClient { .. } => "invalid_client",
            Self::InvalidGrant { .. } => "invalid_grant",
            Self::UnauthorizedClient { .. } => "unauthorized_client",
            Self::UnsupportedGrantType { .. } => "unsupported_grant_type",
            Self::InvalidScope { .. } => "invalid_scope",
            Self::Storage { .. } | Self::Configuration { .. } | Self::Internal { .. } => {
                "server_error"
            }
        }
    }
}

/// Where in the token flow an error originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Client or grant credentials were rejected.
    Authentication,
    /// The client is not entitled to what it asked for.
    Authorization,
    /// The request itself is malformed.
    Validation,
    /// The access token or response could not be produced.
    Issuance,
    /// Client storage failed.
    Infrastructure,
    Configuration,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Authentication => "authentication",
            Self::Authorization => "authorization",
            Self::Validation => "validation",
            Self::Issuance => "issuance",
            Self::Infrastructure => "infrastructure",
            Self::Configuration => "configuration",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn every_variant() -> Vec<(AuthError, &'static str, ErrorCategory)> {
        vec![
            (
                AuthError::invalid_request("missing grant_type"),
                "invalid_request",
                ErrorCategory::Validation,
            ),
            (
                AuthError::invalid_client("unknown client"),
                "invalid_client",
                ErrorCategory::Authentication,
            ),
            (
                AuthError::invalid_grant("code expired"),
                "invalid_grant",
                ErrorCategory::Authentication,
            ),
            (
                AuthError::unauthorized_client("grant not allowed"),
                "unauthorized_client",
                ErrorCategory::Authorization,
            ),
            (
                AuthError::unsupported_grant_type("implicit"),
                "unsupported_grant_type",
                ErrorCategory::Validation,
            ),
            (
                AuthError::invalid_scope("empty"),
                "invalid_scope",
                ErrorCategory::Authorization,
            ),
            (
                AuthError::storage("registry unavailable"),
                "server_error",
                ErrorCategory::Infrastructure,
            ),
            (
                AuthError::configuration("no signing secret"),
                "server_error",
                ErrorCategory::Configuration,
            ),
            (
                AuthError::internal("signing failed"),
                "server_error",
                ErrorCategory::Issuance,
            ),
        ]
    }

    #[test]
    fn test_codes_and_categories() {
        for (err, code, category) in every_variant() {
            assert_eq!(err.oauth_error_code(), code, "{err}");
            assert_eq!(err.category(), category, "{err}");
            assert_eq!(err.is_server_error(), code == "server_error", "{err}");
        }
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            AuthError::invalid_client("client not found").to_string(),
            "Invalid client: client not found"
        );
        assert_eq!(
            AuthError::unsupported_grant_type("password").to_string(),
            "Unsupported grant type: password"
        );
    }

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::Issuance.to_string(), "issuance");
        assert_eq!(ErrorCategory::Infrastructure.to_string(), "infrastructure");
    }
}
