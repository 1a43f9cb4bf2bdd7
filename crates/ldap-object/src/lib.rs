//! Single-object lookups against an LDAP directory.
//!
//! A lookup resolves a [`QuerySpecification`] into one search, insists that the
//! search matches exactly one entry, and normalizes that entry into a
//! [`NormalizedObject`]. [`ObjectDataSource`] wraps the lookup for a
//! declarative-configuration layer.

#![deny(missing_docs)]

mod datasource;
mod lookup;
mod normalize;
mod query;
mod search;
mod session;

pub use datasource::{
    AttributeKind, ObjectDataSource, ObjectDataSourceConfig, ObjectState, SchemaAttribute,
    READ_ERROR_SUMMARY, TYPE_NAME_SUFFIX,
};
pub use ldap_object_core::{Diagnostic, Error, LdapProviderConfig};
pub use lookup::lookup;
pub use normalize::{normalize, NormalizedObject, RawAttribute, RawEntry, OBJECT_CLASS_ATTRIBUTE};
pub use query::{resolve, QuerySpecification, ResolvedQuery, SearchScope, MATCH_ALL_FILTER};
pub use search::search;
pub use session::{LdapConnector, LdapSession, RealLdapConnector};

/// Convenient result alias that reuses the core error type.
pub type Result<T> = ldap_object_core::Result<T>;
