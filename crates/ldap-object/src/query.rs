//! Query specifications and their resolution into a single search.
//!
//! Fetching an entry by its exact DN and fetching it by search criteria are the
//! same operation downstream: a base-scope search anchored at a DN with the
//! match-all filter returns that DN's own entry if and only if it exists.

use crate::Result;
use ldap3::Scope;
use ldap_object_core::Error;
use std::fmt;
use std::str::FromStr;

/// The absolute true filter (RFC 4526), matching every entry.
pub const MATCH_ALL_FILTER: &str = "(&)";

/// How far a search extends from its base DN.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SearchScope {
    /// The base entry only.
    #[default]
    BaseObject,
    /// Immediate children of the base.
    SingleLevel,
    /// The base and all of its descendants.
    WholeSubtree,
}

impl SearchScope {
    /// Every scope, in the order the names are documented.
    pub const ALL: [SearchScope; 3] = [
        SearchScope::BaseObject,
        SearchScope::SingleLevel,
        SearchScope::WholeSubtree,
    ];

    /// Configuration name of the scope (`baseObject`, `singleLevel`, `wholeSubtree`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BaseObject => "baseObject",
            Self::SingleLevel => "singleLevel",
            Self::WholeSubtree => "wholeSubtree",
        }
    }
}

impl fmt::Display for SearchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchScope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|scope| scope.as_str() == s)
            .ok_or_else(|| {
                Error::ValidationError(format!(
                    "scope must be one of baseObject, singleLevel, wholeSubtree; got `{s}`"
                ))
            })
    }
}

impl From<SearchScope> for Scope {
    fn from(scope: SearchScope) -> Self {
        match scope {
            SearchScope::BaseObject => Scope::Base,
            SearchScope::SingleLevel => Scope::OneLevel,
            SearchScope::WholeSubtree => Scope::Subtree,
        }
    }
}

/// What the caller asked for: one exact DN, or a search that must match one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuerySpecification {
    /// Fetch the entry at this distinguished name.
    ByIdentifier {
        /// Fully qualified DN of the entry.
        identifier: String,
    },
    /// Search under a base DN.
    BySearch {
        /// DN to search under.
        base_location: String,
        /// Search scope; [`SearchScope::BaseObject`] when absent.
        scope: Option<SearchScope>,
        /// Filter expression; [`MATCH_ALL_FILTER`] when absent.
        filter: Option<String>,
    },
}

/// The `(location, scope, filter)` triple actually sent to the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedQuery {
    /// Search base DN.
    pub location: String,
    /// Search scope.
    pub scope: SearchScope,
    /// Filter expression.
    pub filter: String,
}

/// Resolves a specification into the single search that answers it.
///
/// # Errors
///
/// Returns [`Error::InvalidSpecification`] when the identifier or base DN is empty.
pub fn resolve(spec: &QuerySpecification) -> Result<ResolvedQuery> {
    match spec {
        QuerySpecification::ByIdentifier { identifier } => {
            if identifier.trim().is_empty() {
                return Err(Error::InvalidSpecification(
                    "identifier must not be empty".to_string(),
                ));
            }
            Ok(ResolvedQuery {
                location: identifier.clone(),
                scope: SearchScope::BaseObject,
                filter: MATCH_ALL_FILTER.to_string(),
            })
        }
        QuerySpecification::BySearch {
            base_location,
            scope,
            filter,
        } => {
            if base_location.trim().is_empty() {
                return Err(Error::InvalidSpecification(
                    "base location must not be empty".to_string(),
                ));
            }
            Ok(ResolvedQuery {
                location: base_location.clone(),
                scope: scope.unwrap_or_default(),
                filter: filter
                    .clone()
                    .unwrap_or_else(|| MATCH_ALL_FILTER.to_string()),
            })
        }
    }
}
