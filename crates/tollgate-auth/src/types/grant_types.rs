//! The set of grant types named by a token request.

use std::collections::BTreeSet;
use std::fmt;

use crate::error::AuthError;
use crate::types::GrantType;

/// Non-empty set of grant types requested in a single token request.
///
/// The `grant_type` parameter is space-delimited, so a request may name more
/// than one grant type. Policies that must only fire for a specific flow use
/// [`GrantTypes::is_exactly`], never [`GrantTypes::contains`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantTypes(BTreeSet<GrantType>);

impl GrantTypes {
    /// Parses a raw `grant_type` parameter.
    ///
    /// # Errors
    ///
    /// - `invalid_request` if the parameter holds no grant type
    /// - `unsupported_grant_type` if any value is not a known grant type
    pub fn parse(raw: &str) -> Result<Self, AuthError> {
        let mut set = BTreeSet::new();
        for value in raw.split_whitespace() {
            let grant: GrantType = value
                .parse()
                .map_err(|_| AuthError::unsupported_grant_type(value))?;
            set.insert(grant);
        }

        if set.is_empty() {
            return Err(AuthError::invalid_request("Missing grant_type parameter"));
        }

        Ok(Self(set))
    }

    /// Returns `true` if the set is exactly `{grant}`.
    #[must_use]
    pub fn is_exactly(&self, grant: GrantType) -> bool {
        self.0.len() == 1 && self.0.contains(&grant)
    }

    /// Returns `true` if the set contains `grant`.
    #[must_use]
    pub fn contains(&self, grant: GrantType) -> bool {
        self.0.contains(&grant)
    }

    /// Iterates over the grant types.
    pub fn iter(&self) -> impl Iterator<Item = GrantType> + '_ {
        self.0.iter().copied()
    }

    /// Number of distinct grant types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`: a `GrantTypes` value is never empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for GrantTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(GrantType::as_str).collect();
        write!(f, "{}", names.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single() {
        let grants = GrantTypes::parse("client_credentials").unwrap();
        assert_eq!(grants.len(), 1);
        assert!(grants.is_exactly(GrantType::ClientCredentials));
    }

    #[test]
    fn test_parse_multiple_and_duplicates() {
        let grants = GrantTypes::parse("client_credentials refresh_token client_credentials").unwrap();
        assert_eq!(grants.len(), 2);
        assert!(grants.contains(GrantType::ClientCredentials));
        assert!(grants.contains(GrantType::RefreshToken));
    }

    #[test]
    fn test_duplicate_singleton_is_still_exact() {
        let grants = GrantTypes::parse("client_credentials client_credentials").unwrap();
        assert!(grants.is_exactly(GrantType::ClientCredentials));
    }

    #[test]
    fn test_is_exactly_is_set_equality_not_membership() {
        let hybrid = GrantTypes::parse("client_credentials refresh_token").unwrap();
        assert!(hybrid.contains(GrantType::ClientCredentials));
        assert!(!hybrid.is_exactly(GrantType::ClientCredentials));
    }

    #[test]
    fn test_parse_empty_is_invalid_request() {
        let err = GrantTypes::parse("   ").unwrap_err();
        assert_eq!(err.oauth_error_code(), "invalid_request");
    }

    #[test]
    fn test_parse_unknown_is_unsupported() {
        let err = GrantTypes::parse("client_credentials implicit").unwrap_err();
        assert!(matches!(
            err,
            AuthError::UnsupportedGrantType { ref grant_type } if grant_type == "implicit"
        ));
    }
}
