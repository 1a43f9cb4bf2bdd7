//! Generic LDAP object data source.
//!
//! Binds a declarative configuration (`dn`, or `base_dn` with optional `scope`
//! and `filter`) to a lookup and exposes the result as [`ObjectState`].

use crate::{
    lookup::lookup,
    normalize::NormalizedObject,
    query::{QuerySpecification, SearchScope},
    session::LdapSession,
    Result,
};
use ldap_object_core::{Diagnostic, Error};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use tracing::warn;
use validator::{Validate, ValidationError, ValidationErrors};

/// Suffix appended to the provider type name.
pub const TYPE_NAME_SUFFIX: &str = "_object";

/// Summary attached to every failed read.
pub const READ_ERROR_SUMMARY: &str = "Can not read entry";

/// Value shape of a schema attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    /// A single string.
    String,
    /// A list of strings.
    StringList,
    /// A map from name to a list of strings.
    StringListMap,
}

/// One attribute of the data source schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SchemaAttribute {
    /// Attribute name.
    pub name: &'static str,
    /// Markdown description.
    pub description: &'static str,
    /// Value shape.
    pub kind: AttributeKind,
    /// Whether the caller may set it.
    pub optional: bool,
    /// Whether the read fills it in.
    pub computed: bool,
}

const SCHEMA: &[SchemaAttribute] = &[
    SchemaAttribute {
        name: "id",
        description: "Datasource identifier",
        kind: AttributeKind::String,
        optional: false,
        computed: true,
    },
    SchemaAttribute {
        name: "dn",
        description: "DN of this ldap object",
        kind: AttributeKind::String,
        optional: true,
        computed: true,
    },
    SchemaAttribute {
        name: "base_dn",
        description: "Base DN to use to search for the ldap object",
        kind: AttributeKind::String,
        optional: true,
        computed: false,
    },
    SchemaAttribute {
        name: "scope",
        description: "Scope to use to search for the ldap object",
        kind: AttributeKind::String,
        optional: true,
        computed: false,
    },
    SchemaAttribute {
        name: "filter",
        description: "Filter to use to search for the ldap object",
        kind: AttributeKind::String,
        optional: true,
        computed: false,
    },
    SchemaAttribute {
        name: "object_classes",
        description: "A list of classes this object implements",
        kind: AttributeKind::StringList,
        optional: false,
        computed: true,
    },
    SchemaAttribute {
        name: "attributes",
        description: "The attributes of this object, keyed by attribute type",
        kind: AttributeKind::StringListMap,
        optional: false,
        computed: true,
    },
];

/// Caller-supplied configuration of a data source read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectDataSourceConfig {
    /// Exact DN of the object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dn: Option<String>,
    /// DN to search under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_dn: Option<String>,
    /// Search scope name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Search filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

impl ObjectDataSourceConfig {
    /// Reads the object at `dn`.
    #[must_use]
    pub fn by_dn(dn: impl Into<String>) -> Self {
        Self {
            dn: Some(dn.into()),
            ..Self::default()
        }
    }

    /// Searches under `base_dn`.
    #[must_use]
    pub fn by_search(base_dn: impl Into<String>) -> Self {
        Self {
            base_dn: Some(base_dn.into()),
            ..Self::default()
        }
    }

    /// Sets the search scope name.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Sets the search filter.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Validates the configuration and turns it into a query specification.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] describing every violated rule.
    pub fn to_specification(&self) -> Result<QuerySpecification> {
        self.validate()?;

        match (&self.dn, &self.base_dn) {
            (Some(dn), None) => Ok(QuerySpecification::ByIdentifier {
                identifier: dn.clone(),
            }),
            (None, Some(base_dn)) => Ok(QuerySpecification::BySearch {
                base_location: base_dn.clone(),
                scope: self
                    .scope
                    .as_deref()
                    .map(str::parse::<SearchScope>)
                    .transpose()?,
                filter: self.filter.clone(),
            }),
            _ => Err(Error::InvalidSpecification(
                "exactly one of dn and base_dn must be set".to_string(),
            )),
        }
    }
}

fn violation(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

impl Validate for ObjectDataSourceConfig {
    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.dn.is_some() == self.base_dn.is_some() {
            errors.add(
                "dn",
                violation("exactly_one_of", "exactly one of dn and base_dn must be set"),
            );
        }
        if self.dn.is_some() && self.scope.is_some() {
            errors.add("scope", violation("conflicts_with", "scope conflicts with dn"));
        }
        if self.dn.is_some() && self.filter.is_some() {
            errors.add("filter", violation("conflicts_with", "filter conflicts with dn"));
        }
        if let Some(scope) = &self.scope {
            if scope.parse::<SearchScope>().is_err() {
                errors.add(
                    "scope",
                    violation(
                        "one_of",
                        "scope must be one of baseObject, singleLevel, wholeSubtree",
                    ),
                );
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// State written back after a successful read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectState {
    /// Identifier; the object's DN.
    pub id: String,
    /// DN of the object.
    pub dn: String,
    /// Search base, as configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_dn: Option<String>,
    /// Search scope, as configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Search filter, as configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    /// Object classes of the entry.
    pub object_classes: Vec<String>,
    /// All other attributes of the entry.
    pub attributes: BTreeMap<String, Vec<String>>,
}

impl ObjectState {
    fn from_object(config: &ObjectDataSourceConfig, object: NormalizedObject) -> Self {
        Self {
            id: object.dn.clone(),
            dn: object.dn,
            base_dn: config.base_dn.clone(),
            scope: config.scope.clone(),
            filter: config.filter.clone(),
            object_classes: object.object_classes,
            attributes: object.attributes,
        }
    }
}

/// Data source reading one LDAP object per call.
#[derive(Default)]
pub struct ObjectDataSource {
    session: Option<Box<dyn LdapSession>>,
}

impl ObjectDataSource {
    /// Creates an unconfigured data source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Full type name under the given provider type name.
    #[must_use]
    pub fn type_name(provider_type_name: &str) -> String {
        format!("{provider_type_name}{TYPE_NAME_SUFFIX}")
    }

    /// Attribute schema of the data source.
    #[must_use]
    pub fn schema() -> &'static [SchemaAttribute] {
        SCHEMA
    }

    /// Hands the data source the session its reads run on.
    pub fn configure(&mut self, session: Box<dyn LdapSession>) {
        self.session = Some(session);
    }

    /// Returns true once a session has been configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.session.is_some()
    }

    /// Reads the object described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unconfigured`] without searching when no session was
    /// configured, and any validation or lookup failure otherwise.
    pub async fn read(&mut self, config: &ObjectDataSourceConfig) -> Result<ObjectState> {
        let spec = config.to_specification()?;
        let session = self.session.as_deref_mut().ok_or_else(|| {
            Error::Unconfigured("no directory session has been configured".to_string())
        })?;
        let object = lookup(session, &spec).await?;
        Ok(ObjectState::from_object(config, object))
    }

    /// Like [`read`](Self::read), reporting a failure as one [`Diagnostic`].
    ///
    /// # Errors
    ///
    /// Returns the diagnostic for whatever made the read fail.
    pub async fn read_with_diagnostics(
        &mut self,
        config: &ObjectDataSourceConfig,
    ) -> std::result::Result<ObjectState, Diagnostic> {
        self.read(config).await.map_err(|err| {
            if err.should_log() {
                warn!(code = err.error_code(), "{READ_ERROR_SUMMARY}: {err}");
            }
            err.into_diagnostic(READ_ERROR_SUMMARY)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::RawEntry;
    use crate::session::{LdapConnector, MockLdapConnector, MockLdapSession};

    fn alice_session() -> MockLdapSession {
        let mut session = MockLdapSession::new();
        session.expect_search().times(1).returning(|_, _, _| {
            Ok(vec![RawEntry::new("cn=alice,dc=example,dc=com")
                .with_attribute("objectClass", ["top", "person"])
                .with_attribute("mail", ["alice@example.com"])])
        });
        session
    }

    #[test]
    fn type_name_has_object_suffix() {
        assert_eq!(ObjectDataSource::type_name("ldap"), "ldap_object");
    }

    #[test]
    fn schema_lists_every_state_field() {
        let names: Vec<&str> = ObjectDataSource::schema()
            .iter()
            .map(|attribute| attribute.name)
            .collect();
        assert_eq!(
            names,
            vec!["id", "dn", "base_dn", "scope", "filter", "object_classes", "attributes"]
        );

        let dn = &ObjectDataSource::schema()[1];
        assert!(dn.optional && dn.computed);
    }

    #[test]
    fn dn_config_becomes_identifier_spec() {
        let spec = ObjectDataSourceConfig::by_dn("cn=alice,dc=example,dc=com")
            .to_specification()
            .unwrap();
        assert_eq!(
            spec,
            QuerySpecification::ByIdentifier {
                identifier: "cn=alice,dc=example,dc=com".to_string()
            }
        );
    }

    #[test]
    fn search_config_becomes_search_spec() {
        let spec = ObjectDataSourceConfig::by_search("dc=example,dc=com")
            .with_scope("wholeSubtree")
            .with_filter("(uid=alice)")
            .to_specification()
            .unwrap();
        assert_eq!(
            spec,
            QuerySpecification::BySearch {
                base_location: "dc=example,dc=com".to_string(),
                scope: Some(SearchScope::WholeSubtree),
                filter: Some("(uid=alice)".to_string()),
            }
        );
    }

    #[test]
    fn dn_and_base_dn_are_exclusive() {
        let both = ObjectDataSourceConfig {
            dn: Some("cn=a,dc=example,dc=com".to_string()),
            base_dn: Some("dc=example,dc=com".to_string()),
            ..ObjectDataSourceConfig::default()
        };
        assert!(matches!(
            both.to_specification(),
            Err(Error::ValidationError(_))
        ));

        let neither = ObjectDataSourceConfig::default();
        assert!(matches!(
            neither.to_specification(),
            Err(Error::ValidationError(_))
        ));
    }

    #[test]
    fn scope_and_filter_conflict_with_dn() {
        let config = ObjectDataSourceConfig::by_dn("cn=a,dc=example,dc=com")
            .with_scope("singleLevel")
            .with_filter("(cn=a)");

        let errors = config.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("scope"));
        assert!(fields.contains_key("filter"));
    }

    #[test]
    fn unknown_scope_is_rejected() {
        let config = ObjectDataSourceConfig::by_search("dc=example,dc=com").with_scope("sub");
        match config.to_specification() {
            Err(Error::ValidationError(message)) => assert!(message.contains("scope")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn config_deserializes_from_json() {
        let config: ObjectDataSourceConfig =
            serde_json::from_str(r#"{"base_dn": "dc=example,dc=com", "filter": "(cn=bob)"}"#)
                .unwrap();
        assert_eq!(
            config,
            ObjectDataSourceConfig::by_search("dc=example,dc=com").with_filter("(cn=bob)")
        );
    }

    #[tokio::test]
    async fn read_fills_state() {
        let mut source = ObjectDataSource::new();
        source.configure(Box::new(alice_session()));

        let state = source
            .read(&ObjectDataSourceConfig::by_dn("cn=alice,dc=example,dc=com"))
            .await
            .unwrap();

        assert_eq!(state.id, "cn=alice,dc=example,dc=com");
        assert_eq!(state.dn, "cn=alice,dc=example,dc=com");
        assert!(state.base_dn.is_none());
        assert_eq!(state.object_classes, vec!["top", "person"]);
        assert_eq!(state.attributes["mail"], vec!["alice@example.com"]);

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["object_classes"][1], "person");
        assert!(json.get("scope").is_none());
    }

    #[tokio::test]
    async fn configure_from_connector() {
        let mut connector = MockLdapConnector::new();
        connector
            .expect_connect()
            .times(1)
            .return_once(|| Ok(Box::new(alice_session())));

        let mut source = ObjectDataSource::new();
        source.configure(connector.connect().await.unwrap());
        assert!(source.is_configured());

        let state = source
            .read(&ObjectDataSourceConfig::by_dn("cn=alice,dc=example,dc=com"))
            .await
            .unwrap();
        assert_eq!(state.object_classes, vec!["top", "person"]);
    }

    #[tokio::test]
    async fn unconfigured_read_fails_without_search() {
        let mut source = ObjectDataSource::new();
        assert!(!source.is_configured());

        let result = source
            .read(&ObjectDataSourceConfig::by_dn("cn=alice,dc=example,dc=com"))
            .await;
        assert!(matches!(result, Err(Error::Unconfigured(_))));
    }

    #[tokio::test]
    async fn failed_read_yields_single_diagnostic() {
        let mut session = MockLdapSession::new();
        session
            .expect_search()
            .times(1)
            .returning(|_, _, _| Ok(Vec::new()));
        let mut source = ObjectDataSource::new();
        source.configure(Box::new(session));

        let diagnostic = source
            .read_with_diagnostics(&ObjectDataSourceConfig::by_dn("cn=ghost,dc=example,dc=com"))
            .await
            .unwrap_err();
        assert_eq!(diagnostic.summary, READ_ERROR_SUMMARY);
        assert_eq!(diagnostic.code, "NOT_FOUND");
        assert!(diagnostic.detail.contains("cn=ghost,dc=example,dc=com"));
    }
}
