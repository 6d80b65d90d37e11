//! Opaque bearer tokens.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;

use crate::AuthResult;
use crate::oauth::request::AccessRequest;
use crate::oauth::session::Session;
use crate::token::AccessTokenStrategy;

/// Random bytes per token.
const TOKEN_BYTES: usize = 32;

/// Issues 256-bit random tokens, base64url-encoded without padding.
///
/// Tokens carry no information; resource servers have to look them up.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpaqueTokenStrategy;

impl AccessTokenStrategy for OpaqueTokenStrategy {
    fn generate(
        &self,
        _request: &AccessRequest,
        _session: &Session,
        _lifetime: Duration,
    ) -> AuthResult<String> {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::request::tests::{access_request, service_client};

    #[test]
    fn test_opaque_tokens_are_random_and_url_safe() {
        let request = access_request("client_credentials", "", service_client(&[]));
        let session = Session::new();
        let lifetime = Duration::from_secs(60);

        let a = OpaqueTokenStrategy.generate(&request, &session, lifetime).unwrap();
        let b = OpaqueTokenStrategy.generate(&request, &session, lifetime).unwrap();

        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
