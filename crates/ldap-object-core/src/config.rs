//! Configuration for the directory connection provider.
//!
//! The provider opens and binds the session that object lookups run on. Lookups
//! themselves never read this configuration; they only receive the session.

use crate::Error;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Cow;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;
use validator::{Validate, ValidationError};

/// Default connection timeout (seconds).
pub const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 10;
/// Default operation timeout (seconds).
pub const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 10;

/// Connection settings for an LDAP directory.
#[derive(Debug, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_bind_credentials"))]
pub struct LdapProviderConfig {
    /// Directory URL (`ldap://` or `ldaps://`)
    #[validate(url)]
    pub url: String,

    /// DN to bind as; the session stays anonymous when unset. Requires
    /// `bind_password`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind_dn: Option<String>,

    /// Password for `bind_dn`
    #[serde(
        default,
        skip_serializing,
        deserialize_with = "deserialize_secret"
    )]
    pub bind_password: Option<SecretString>,

    /// Whether to verify TLS certificates
    #[serde(default = "default_tls_verify")]
    pub tls_verify: bool,

    /// Optional path to custom CA certificate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_ca_cert: Option<PathBuf>,

    /// Connection timeout in seconds
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_connection_timeout_secs")]
    pub connection_timeout_secs: u64,

    /// Per-operation timeout in seconds
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_operation_timeout_secs")]
    pub operation_timeout_secs: u64,
}

const fn default_tls_verify() -> bool {
    true
}

const fn default_connection_timeout_secs() -> u64 {
    DEFAULT_CONNECTION_TIMEOUT_SECS
}

const fn default_operation_timeout_secs() -> u64 {
    DEFAULT_OPERATION_TIMEOUT_SECS
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(SecretString::from))
}

/// A bind DN and its password come together; either alone would silently
/// fall back to an anonymous session.
fn validate_bind_credentials(config: &LdapProviderConfig) -> Result<(), ValidationError> {
    let message = match (&config.bind_dn, &config.bind_password) {
        (Some(_), None) => "bind_dn is set but bind_password is missing",
        (None, Some(_)) => "bind_password is set but bind_dn is missing",
        _ => return Ok(()),
    };
    let mut error = ValidationError::new("bind_password_required");
    error.message = Some(Cow::Borrowed(message));
    Err(error)
}

impl LdapProviderConfig {
    /// Create a new provider configuration for the given directory URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or validation fails.
    pub fn new(url: impl Into<String>) -> Result<Self, Error> {
        let config = Self {
            url: url.into(),
            bind_dn: None,
            bind_password: None,
            tls_verify: default_tls_verify(),
            tls_ca_cert: None,
            connection_timeout_secs: default_connection_timeout_secs(),
            operation_timeout_secs: default_operation_timeout_secs(),
        };

        config
            .validate()
            .map_err(|e| Error::ConfigError(format!("Invalid configuration: {e}")))?;

        Ok(config)
    }

    /// Set the bind credentials.
    #[must_use]
    pub fn with_bind(mut self, bind_dn: impl Into<String>, password: impl Into<String>) -> Self {
        self.bind_dn = Some(bind_dn.into());
        self.bind_password = Some(SecretString::from(password.into()));
        self
    }

    /// Set whether to verify TLS certificates.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Set custom CA certificate path.
    #[must_use]
    pub fn with_ca_cert(mut self, path: PathBuf) -> Self {
        self.tls_ca_cert = Some(path);
        self
    }

    /// Set connection timeout in seconds.
    #[must_use]
    pub const fn with_connection_timeout(mut self, seconds: u64) -> Self {
        self.connection_timeout_secs = seconds;
        self
    }

    /// Set operation timeout in seconds.
    #[must_use]
    pub const fn with_operation_timeout(mut self, seconds: u64) -> Self {
        self.operation_timeout_secs = seconds;
        self
    }

    /// Returns the bind DN and password, if both are configured.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.bind_dn, &self.bind_password) {
            (Some(dn), Some(password)) => Some((dn.as_str(), password.expose_secret())),
            _ => None,
        }
    }

    /// Get the connection timeout as a Duration.
    #[must_use]
    pub const fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    /// Get the operation timeout as a Duration.
    #[must_use]
    pub const fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }

    /// Parse and validate the directory URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed or is not an LDAP URL.
    pub fn parse_url(&self) -> Result<Url, Error> {
        let url = Url::parse(&self.url)
            .map_err(|e| Error::ConfigError(format!("Invalid directory URL: {e}")))?;
        match url.scheme() {
            "ldap" | "ldaps" | "ldapi" => Ok(url),
            other => Err(Error::ConfigError(format!(
                "Unsupported directory URL scheme `{other}`"
            ))),
        }
    }
}
