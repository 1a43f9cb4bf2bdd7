//! # ldap-object-core
//!
//! Shared error and configuration types for resolving a single object in an
//! LDAP directory.
//!
//! ## Modules
//!
//! - [`error`] - Failure taxonomy and user-facing diagnostics
//! - [`config`] - Connection provider configuration

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;

// Re-export commonly used types
pub use config::LdapProviderConfig;
pub use error::{Diagnostic, Error, Result};
