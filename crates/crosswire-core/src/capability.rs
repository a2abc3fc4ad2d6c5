//! Capability model — typed descriptions of what a peer offers or accepts.

use crate::error::CapabilityError;
use crate::version::SemanticVersion;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

fn namespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[a-z][a-z0-9]*(\.[a-z][a-z0-9]*)*$").expect("static pattern")
    })
}

fn name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("static pattern"))
}

/// Unique identifier for a capability.
///
/// Canonical string form: `namespace.name.major.minor.patch`, e.g.
/// `robot.mobility.move.1.0.0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CapabilityId {
    namespace: String,
    name: String,
    version: SemanticVersion,
}

impl CapabilityId {
    /// Create a capability ID, validating namespace and name grammar.
    ///
    /// Namespace: dot-separated lowercase alphanumeric segments, each
    /// starting with a letter. Name: lowercase alphanumeric plus underscore,
    /// starting with a letter.
    pub fn new(
        namespace: &str,
        name: &str,
        version: SemanticVersion,
    ) -> Result<Self, CapabilityError> {
        if !namespace_re().is_match(namespace) {
            return Err(CapabilityError::InvalidNamespace(namespace.to_string()));
        }
        if !name_re().is_match(name) {
            return Err(CapabilityError::InvalidName(name.to_string()));
        }
        Ok(Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
            version,
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> SemanticVersion {
        self.version
    }
}

impl fmt::Display for CapabilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.namespace, self.name, self.version)
    }
}

impl FromStr for CapabilityId {
    type Err = CapabilityError;

    /// Parse the canonical form. The trailing three segments are the
    /// version, the segment before them is the name, and everything earlier
    /// is the namespace — so at least 5 segments are required, of which at
    /// least 2 are not part of the version.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() < 5 {
            return Err(CapabilityError::InvalidIdFormat(s.to_string()));
        }
        let (head, version_parts) = parts.split_at(parts.len() - 3);
        if head.len() < 2 {
            return Err(CapabilityError::InvalidIdFormat(s.to_string()));
        }
        let version: SemanticVersion = version_parts.join(".").parse()?;
        let name = head[head.len() - 1];
        let namespace = head[..head.len() - 1].join(".");
        Self::new(&namespace, name, version)
    }
}

impl TryFrom<String> for CapabilityId {
    type Error = CapabilityError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<CapabilityId> for String {
    fn from(id: CapabilityId) -> Self {
        id.to_string()
    }
}

/// Schema value types, following JSON Schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
    Null,
}

/// JSON-Schema-like description of a capability's input or output.
///
/// Pure value data, immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilitySchema {
    #[serde(rename = "type")]
    pub schema_type: SchemaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<HashMap<String, PropertySchema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CapabilitySchema {
    pub fn new(schema_type: SchemaType) -> Self {
        Self {
            schema_type,
            properties: None,
            required: None,
            description: None,
        }
    }
}

/// Property definition within a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub schema_type: SchemaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
}

impl PropertySchema {
    pub fn new(schema_type: SchemaType) -> Self {
        Self {
            schema_type,
            description: None,
            format: None,
            minimum: None,
            maximum: None,
            enum_values: None,
        }
    }
}

/// A capability a peer can provide or accept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capability {
    pub id: CapabilityId,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<CapabilitySchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<CapabilitySchema>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Capability {
    pub fn new(id: CapabilityId, description: impl Into<String>) -> Self {
        Self {
            id,
            description: description.into(),
            input_schema: None,
            output_schema: None,
            metadata: HashMap::new(),
        }
    }

    /// Convenience constructor parsing the canonical ID string.
    pub fn parse(
        capability: &str,
        description: impl Into<String>,
    ) -> Result<Self, CapabilityError> {
        Ok(Self::new(capability.parse()?, description))
    }
}

/// A collection of capabilities keyed by ID.
///
/// Inserting a capability with an ID already present replaces the existing
/// entry (last write wins). Lookup results carry no ordering guarantee.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Capability>", into = "Vec<Capability>")]
pub struct CapabilitySet {
    capabilities: HashMap<CapabilityId, Capability>,
}

impl CapabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, capability: Capability) {
        self.capabilities.insert(capability.id.clone(), capability);
    }

    pub fn remove(&mut self, id: &CapabilityId) -> Option<Capability> {
        self.capabilities.remove(id)
    }

    pub fn contains(&self, id: &CapabilityId) -> bool {
        self.capabilities.contains_key(id)
    }

    /// Find a capability by exact ID.
    pub fn find(&self, id: &CapabilityId) -> Option<&Capability> {
        self.capabilities.get(id)
    }

    /// Find all capabilities in a namespace.
    pub fn find_by_namespace(&self, namespace: &str) -> Vec<&Capability> {
        self.capabilities
            .values()
            .filter(|c| c.id.namespace() == namespace)
            .collect()
    }

    /// Find all capabilities with a given name, in any namespace.
    pub fn find_by_name(&self, name: &str) -> Vec<&Capability> {
        self.capabilities
            .values()
            .filter(|c| c.id.name() == name)
            .collect()
    }

    /// Find a capability with the same namespace and name whose version is
    /// compatible with the required version.
    ///
    /// Tie-break policy: the first compatible match in the underlying map's
    /// iteration order is returned. When multiple versions of the same
    /// `namespace.name` are registered, which one wins is unspecified;
    /// callers needing highest-version-wins should filter
    /// [`find_by_name`](Self::find_by_name) themselves.
    pub fn find_compatible(&self, required: &CapabilityId) -> Option<&Capability> {
        self.capabilities.values().find(|c| {
            c.id.namespace() == required.namespace()
                && c.id.name() == required.name()
                && c.id.version().is_compatible_with(&required.version())
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Capability> {
        self.capabilities.values()
    }

    /// All capability IDs in the set.
    pub fn ids(&self) -> Vec<CapabilityId> {
        self.capabilities.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}

impl From<Vec<Capability>> for CapabilitySet {
    fn from(capabilities: Vec<Capability>) -> Self {
        let mut set = Self::new();
        for capability in capabilities {
            set.add(capability);
        }
        set
    }
}

impl From<CapabilitySet> for Vec<Capability> {
    fn from(set: CapabilitySet) -> Self {
        set.capabilities.into_values().collect()
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        let mut set = Self::new();
        for capability in iter {
            set.add(capability);
        }
        set
    }
}
