//! Directory sessions and the connector that opens them.

use crate::{
    normalize::{RawAttribute, RawEntry},
    query::SearchScope,
    Result,
};
use async_trait::async_trait;
use ldap3::{LdapConnAsync, LdapConnSettings, LdapError, SearchEntry};
use ldap_object_core::{Error, LdapProviderConfig};
use native_tls::{Certificate, TlsConnector};
use std::fs;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;
use validator::Validate;

/// LDAP result code `noSuchObject`.
const NO_SUCH_OBJECT: u32 = 32;

/// An opened, bound directory session.
///
/// Lookups borrow the session mutably for a single search and never change its
/// lifecycle; opening, binding and closing belong to whoever handed it over.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LdapSession: Send {
    /// Searches `base_dn` with the given scope and filter, requesting every
    /// attribute and no size or time limit.
    async fn search(
        &mut self,
        base_dn: &str,
        scope: SearchScope,
        filter: &str,
    ) -> Result<Vec<RawEntry>>;
}

/// Opens directory sessions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LdapConnector: Send + Sync {
    /// Opens a session, binding with the configured credentials if any.
    async fn connect(&self) -> Result<Box<dyn LdapSession>>;
}

/// Connector backed by `ldap3`.
pub struct RealLdapConnector {
    config: Arc<LdapProviderConfig>,
}

impl RealLdapConnector {
    /// Creates a new connector instance.
    #[must_use]
    pub fn new(config: Arc<LdapProviderConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl LdapConnector for RealLdapConnector {
    async fn connect(&self) -> Result<Box<dyn LdapSession>> {
        self.config
            .validate()
            .map_err(|e| Error::ConfigError(format!("Invalid configuration: {e}")))?;
        let url = self.config.parse_url()?;
        let settings = build_ldap_settings(&self.config)?;
        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, url.as_str())
            .await
            .map_err(map_ldap_error)?;
        ldap3::drive!(conn);

        if let Some((bind_dn, password)) = self.config.credentials() {
            let bound = within(
                self.config.operation_timeout(),
                &format!("bind as `{bind_dn}`"),
                ldap.simple_bind(bind_dn, password),
            )
            .await?;
            bound
                .success()
                .map_err(|err| bind_failure(bind_dn, &err))?;
            debug!(bind_dn, "bound directory session");
        }

        Ok(Box::new(RealLdapSession {
            inner: ldap,
            operation_timeout: self.config.operation_timeout(),
        }))
    }
}

struct RealLdapSession {
    inner: ldap3::Ldap,
    operation_timeout: Duration,
}

#[async_trait]
impl LdapSession for RealLdapSession {
    async fn search(
        &mut self,
        base_dn: &str,
        scope: SearchScope,
        filter: &str,
    ) -> Result<Vec<RawEntry>> {
        let request = self
            .inner
            .search(base_dn, scope.into(), filter, Vec::<&str>::new());
        let (entries, _) = within(
            self.operation_timeout,
            &format!("search under `{base_dn}`"),
            request,
        )
        .await?
        .success()
        .map_err(map_ldap_error)?;
        Ok(entries
            .into_iter()
            .map(SearchEntry::construct)
            .map(raw_entry)
            .collect())
    }
}

/// Awaits one directory operation under `limit`; an elapsed limit is a
/// transport failure.
async fn within<F, T>(limit: Duration, operation: &str, fut: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, LdapError>>,
{
    timeout(limit, fut)
        .await
        .map_err(|_| Error::DirectoryUnavailable(format!("{operation} timed out")))?
        .map_err(map_ldap_error)
}

/// A rejected bind means the configured credentials are wrong.
fn bind_failure(bind_dn: &str, err: &LdapError) -> Error {
    Error::ConfigError(format!("bind as `{bind_dn}` failed: {err}"))
}

/// Binary values are rendered lossily as UTF-8.
fn raw_entry(entry: SearchEntry) -> RawEntry {
    let mut attributes = entry
        .attrs
        .into_iter()
        .map(|(name, values)| RawAttribute { name, values })
        .collect::<Vec<_>>();
    attributes.extend(entry.bin_attrs.into_iter().map(|(name, values)| {
        RawAttribute {
            name,
            values: values
                .iter()
                .map(|value| String::from_utf8_lossy(value).into_owned())
                .collect(),
        }
    }));
    RawEntry {
        dn: entry.dn,
        attributes,
    }
}

fn build_ldap_settings(config: &LdapProviderConfig) -> Result<LdapConnSettings> {
    let mut settings = LdapConnSettings::new().set_conn_timeout(config.connection_timeout());
    if let Some(connector) = tls_connector(config)? {
        settings = settings.set_connector(connector);
    }
    if !config.tls_verify {
        settings = settings.set_no_tls_verify(true);
    }
    Ok(settings)
}

/// Custom TLS connector, needed only when verification is off or a private CA
/// is configured.
fn tls_connector(config: &LdapProviderConfig) -> Result<Option<TlsConnector>> {
    let mut builder = TlsConnector::builder();
    if !config.tls_verify {
        builder.danger_accept_invalid_certs(true);
    } else if let Some(cert_path) = &config.tls_ca_cert {
        let pem = fs::read(cert_path).map_err(|err| {
            Error::ConfigError(format!(
                "failed to read directory CA certificate {}: {err}",
                cert_path.display()
            ))
        })?;
        let certificate = Certificate::from_pem(&pem)
            .map_err(|err| Error::ConfigError(format!("invalid directory CA certificate: {err}")))?;
        builder.add_root_certificate(certificate);
    } else {
        return Ok(None);
    }

    builder
        .build()
        .map(Some)
        .map_err(|err| Error::ConfigError(format!("failed to build TLS connector: {err}")))
}

/// Maps an `ldap3` failure onto the lookup taxonomy, keeping its text.
pub(crate) fn map_ldap_error(err: LdapError) -> Error {
    match err {
        LdapError::LdapResult { result } if result.rc == NO_SUCH_OBJECT => {
            Error::NotFound(result.to_string())
        }
        LdapError::LdapResult { result } => Error::ProtocolError(result.to_string()),
        err @ LdapError::FilterParsing => Error::ProtocolError(err.to_string()),
        other => Error::DirectoryUnavailable(other.to_string()),
    }
}
