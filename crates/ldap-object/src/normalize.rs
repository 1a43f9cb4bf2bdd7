//! Normalization of raw directory entries.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the attribute extracted into [`NormalizedObject::object_classes`].
pub const OBJECT_CLASS_ATTRIBUTE: &str = "objectClass";

/// One attribute of a raw entry, values in the order the directory sent them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAttribute {
    /// Attribute name as returned by the directory.
    pub name: String,
    /// Attribute values.
    pub values: Vec<String>,
}

impl RawAttribute {
    /// Creates an attribute from a name and its values.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// A directory entry exactly as a search returned it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    /// Distinguished name of the entry.
    pub dn: String,
    /// Attributes of the entry.
    pub attributes: Vec<RawAttribute>,
}

impl RawEntry {
    /// Creates an entry without attributes.
    #[must_use]
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: Vec::new(),
        }
    }

    /// Appends an attribute.
    #[must_use]
    pub fn with_attribute<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes.push(RawAttribute::new(name, values));
        self
    }

    /// Returns all values for the attribute.
    #[must_use]
    pub fn values(&self, attribute: &str) -> Option<&[String]> {
        self.attributes
            .iter()
            .rev()
            .find(|candidate| candidate.name == attribute)
            .map(|candidate| candidate.values.as_slice())
    }
}

/// An entry split into its object classes and its remaining attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedObject {
    /// Distinguished name; also serves as the object's identifier.
    pub dn: String,
    /// Values of `objectClass`, in directory order.
    pub object_classes: Vec<String>,
    /// Every other attribute, keyed by name as returned by the directory.
    pub attributes: BTreeMap<String, Vec<String>>,
}

/// Splits `objectClass` out of the entry and indexes the rest by name.
///
/// The `objectClass` match is case-sensitive. Should a name repeat, the last
/// occurrence wins.
#[must_use]
pub fn normalize(entry: &RawEntry) -> NormalizedObject {
    let mut object = NormalizedObject {
        dn: entry.dn.clone(),
        ..NormalizedObject::default()
    };

    for attribute in &entry.attributes {
        if attribute.name == OBJECT_CLASS_ATTRIBUTE {
            object.object_classes.clone_from(&attribute.values);
        } else {
            object
                .attributes
                .insert(attribute.name.clone(), attribute.values.clone());
        }
    }

    object
}
