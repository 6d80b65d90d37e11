//! Per-request session context.

use std::time::Duration;

use serde_json::{Map, Value};
use time::OffsetDateTime;
use uuid::Uuid;

/// Identity and claims context for one token request.
///
/// The endpoint creates a fresh session for every incoming request. The
/// validator and grant handlers record who the token is for; the response
/// builder reads it when minting the token. A session never outlives its
/// request.
#[derive(Debug, Clone)]
pub struct Session {
    /// Correlation id for logs.
    pub request_id: Uuid,

    /// Subject the token is issued for.
    pub subject: Option<String>,

    /// Authenticated client.
    pub client_id: Option<String>,

    /// Additional claims contributed by grant handlers.
    pub extra: Map<String, Value>,

    /// Lifetime override for the access token, set by grant handlers.
    pub access_token_lifetime: Option<Duration>,

    /// When the request was received.
    pub created_at: OffsetDateTime,
}

impl Session {
    /// Creates an empty session with a fresh request id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            subject: None,
            client_id: None,
            extra: Map::new(),
            access_token_lifetime: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sessions_get_distinct_ids() {
        let a = Session::new();
        let b = Session::new();
        assert_ne!(a.request_id, b.request_id);
        assert!(a.subject.is_none());
        assert!(a.extra.is_empty());
    }
}
