//! Scope auto-grant policy.
//!
//! A client authenticating with `client_credentials` acts on its own behalf,
//! so there is no resource owner to ask for consent. Every requested scope the
//! client is entitled to is granted automatically; the rest are dropped
//! without failing the request.

use std::sync::Arc;

use tracing::debug;

use crate::oauth::request::AccessRequest;
use crate::scope::ScopeStrategy;
use crate::types::GrantType;

/// Grants the client's entitled scopes on a pure `client_credentials` request.
///
/// Applies only when the requested grant types are exactly
/// `{client_credentials}`. A request combining `client_credentials` with
/// another grant type is left untouched. Granted scopes follow requested
/// order.
pub fn auto_grant_client_credentials(request: &mut AccessRequest, strategy: &dyn ScopeStrategy) {
    if !request.grant_types().is_exactly(GrantType::ClientCredentials) {
        return;
    }

    let client = Arc::clone(request.client());
    request.grant_requested_where(|scope| strategy.matches(&client.scopes, scope));

    debug!(
        client_id = %client.client_id,
        requested = %request.requested_scopes(),
        granted = %request.granted_scopes(),
        "Auto-granted client_credentials scopes"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::request::tests::{access_request, service_client};
    use crate::scope::{ExactScopeStrategy, HierarchicScopeStrategy, hierarchic_scope_matches};

    #[test]
    fn test_grants_entitled_scopes_only() {
        let mut request = access_request(
            "client_credentials",
            "api.read api.admin",
            service_client(&["api.read", "api.write"]),
        );

        auto_grant_client_credentials(&mut request, &HierarchicScopeStrategy);
        assert_eq!(request.granted_scopes().to_string(), "api.read");
    }

    #[test]
    fn test_hierarchic_entitlement() {
        let mut request = access_request(
            "client_credentials",
            "api.read.metrics api.write other",
            service_client(&["api"]),
        );

        auto_grant_client_credentials(&mut request, &HierarchicScopeStrategy);
        assert_eq!(
            request.granted_scopes().to_string(),
            "api.read.metrics api.write"
        );
    }

    #[test]
    fn test_exact_strategy_substitution() {
        let mut request = access_request(
            "client_credentials",
            "api.read api",
            service_client(&["api"]),
        );

        auto_grant_client_credentials(&mut request, &ExactScopeStrategy);
        assert_eq!(request.granted_scopes().to_string(), "api");
    }

    #[test]
    fn test_other_grant_type_unchanged() {
        let mut request = access_request(
            "authorization_code",
            "api.read",
            service_client(&["api.read"]),
        );

        auto_grant_client_credentials(&mut request, &HierarchicScopeStrategy);
        assert!(request.granted_scopes().is_empty());
    }

    #[test]
    fn test_hybrid_grant_types_unchanged() {
        // Membership is not enough: the set must be exactly {client_credentials}.
        let mut request = access_request(
            "client_credentials refresh_token",
            "api.read",
            service_client(&["api.read"]),
        );

        auto_grant_client_credentials(&mut request, &HierarchicScopeStrategy);
        assert!(request.granted_scopes().is_empty());
    }

    #[test]
    fn test_client_without_entitlements_gets_nothing() {
        let mut request = access_request(
            "client_credentials",
            "api.read openid",
            service_client(&[]),
        );

        auto_grant_client_credentials(&mut request, &HierarchicScopeStrategy);
        assert!(request.granted_scopes().is_empty());
    }

    #[test]
    fn test_granted_is_ordered_subset_of_requested() {
        let allowed = ["a", "b.c", "d"];
        let mut request = access_request(
            "client_credentials",
            "d.x z b.c.y a b q",
            service_client(&allowed),
        );

        auto_grant_client_credentials(&mut request, &HierarchicScopeStrategy);

        let requested: Vec<&str> = request.requested_scopes().iter().collect();
        let granted: Vec<&str> = request.granted_scopes().iter().collect();
        assert_eq!(granted, vec!["d.x", "b.c.y", "a"]);

        let mut last = 0;
        for scope in &granted {
            let pos = requested.iter().position(|r| r == scope).unwrap();
            assert!(pos >= last);
            last = pos;
            assert!(hierarchic_scope_matches(&allowed, scope));
        }
    }
}
