//! OAuth 2.0 scope handling.
//!
//! Scopes are dot-delimited hierarchies: `api` covers `api.read` and
//! `api.read.metrics`, but never `apikeys` (matching is per component, not per
//! character). Wildcards are not supported; `*` is an ordinary component.
//!
//! # Examples
//!
//! ```
//! use tollgate_auth::scope::{Scopes, hierarchic_scope_matches};
//!
//! let allowed = ["api.read", "billing"];
//! assert!(hierarchic_scope_matches(&allowed, "api.read"));
//! assert!(hierarchic_scope_matches(&allowed, "billing.invoices"));
//! assert!(!hierarchic_scope_matches(&allowed, "api.write"));
//!
//! let requested = Scopes::parse("api.read api.admin api.read");
//! assert_eq!(requested.to_string(), "api.read api.admin");
//! ```

use std::fmt;

/// Separator between components of a hierarchical scope.
pub const SCOPE_DELIMITER: char = '.';

/// Returns `true` if any `granted` scope covers `requested`.
///
/// A granted scope covers a requested scope when the two are equal, or when the
/// granted scope's components are a prefix of the requested scope's components.
/// Empty strings never match on either side.
#[must_use]
pub fn hierarchic_scope_matches<S: AsRef<str>>(granted: &[S], requested: &str) -> bool {
    if requested.is_empty() {
        return false;
    }

    granted.iter().any(|g| covers(g.as_ref(), requested))
}

/// Returns `true` if the single scope `granted` covers `requested`.
fn covers(granted: &str, requested: &str) -> bool {
    if granted.is_empty() {
        return false;
    }
    if granted == requested {
        return true;
    }
    // A broader scope is always shorter than any of its descendants.
    if granted.len() > requested.len() {
        return false;
    }

    let mut requested_parts = requested.split(SCOPE_DELIMITER);
    granted
        .split(SCOPE_DELIMITER)
        .all(|part| requested_parts.next() == Some(part))
}

/// Strategy deciding whether a set of granted scopes covers a requested scope.
///
/// Implementations must be pure: no I/O, no interior state.
pub trait ScopeStrategy: Send + Sync {
    /// Returns `true` if `requested` is covered by `granted`.
    fn matches(&self, granted: &[String], requested: &str) -> bool;
}

/// Hierarchical, dot-delimited prefix matching (the default).
#[derive(Debug, Clone, Copy, Default)]
pub struct HierarchicScopeStrategy;

impl ScopeStrategy for HierarchicScopeStrategy {
    fn matches(&self, granted: &[String], requested: &str) -> bool {
        hierarchic_scope_matches(granted, requested)
    }
}

/// Exact string matching only.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactScopeStrategy;

impl ScopeStrategy for ExactScopeStrategy {
    fn matches(&self, granted: &[String], requested: &str) -> bool {
        !requested.is_empty() && granted.iter().any(|g| g == requested)
    }
}

/// An ordered, duplicate-free list of non-empty scopes.
///
/// Insertion order is preserved so that issued tokens list scopes in the order
/// the client requested them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scopes(Vec<String>);

impl Scopes {
    /// Creates an empty scope list.
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Parses a space-delimited `scope` parameter.
    ///
    /// Empty tokens and repeats are dropped.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        raw.split_whitespace().collect()
    }

    /// Appends a scope if it is non-empty and not already present.
    ///
    /// Returns `true` if the scope was added.
    pub fn push(&mut self, scope: impl Into<String>) -> bool {
        let scope = scope.into();
        if scope.is_empty() || self.contains(&scope) {
            return false;
        }
        self.0.push(scope);
        true
    }

    /// Returns `true` if the exact scope is present.
    #[must_use]
    pub fn contains(&self, scope: &str) -> bool {
        self.0.iter().any(|s| s == scope)
    }

    /// Number of scopes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no scopes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over scopes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Borrows the scopes as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for Scopes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" "))
    }
}

impl<S: Into<String>> FromIterator<S> for Scopes {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut scopes = Self::new();
        for scope in iter {
            scopes.push(scope);
        }
        scopes
    }
}

impl<'a> IntoIterator for &'a Scopes {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
