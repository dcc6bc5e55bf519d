//! Persisted record model: entities, relationships and their properties.
//!
//! This is the store-facing shape of metadata. Domain objects such as
//! [`Port`](super::port::Port) are translated into these records by the
//! mapping in `app::mapper`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ids::{EntityGuid, ExternalSourceGuid, RelationshipGuid};
use super::types::QUALIFIED_NAME_PROPERTY_NAME;

/// A single property value of a stored instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    String(String),
    Enum { ordinal: u32, symbolic_name: String },
    Map(BTreeMap<String, String>),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_symbolic_name(&self) -> Option<&str> {
        match self {
            PropertyValue::Enum { symbolic_name, .. } => Some(symbolic_name),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            PropertyValue::Map(map) => Some(map),
            _ => None,
        }
    }
}

/// Ordered property bag, so structural comparison is deterministic.
pub type InstanceProperties = BTreeMap<String, PropertyValue>;

/// An external source on whose behalf a mutation is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalSource {
    pub guid: ExternalSourceGuid,
    pub qualified_name: String,
}

/// A stored entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDetail {
    pub guid: EntityGuid,
    pub type_name: String,
    pub properties: InstanceProperties,
    pub created_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    pub create_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<DateTime<Utc>>,
    /// Incremented on every property update, starting at 1.
    pub version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_source: Option<String>,
}

impl EntityDetail {
    pub fn qualified_name(&self) -> Option<&str> {
        self.properties
            .get(QUALIFIED_NAME_PROPERTY_NAME)
            .and_then(PropertyValue::as_str)
    }

    pub fn string_property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).and_then(PropertyValue::as_str)
    }

    /// Symbolic name of an enum-valued property.
    pub fn enum_symbolic_name(&self, name: &str) -> Option<&str> {
        self.properties
            .get(name)
            .and_then(PropertyValue::as_symbolic_name)
    }
}

/// A stored, directed, typed edge between two entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub guid: RelationshipGuid,
    pub type_name: String,
    pub end1: EntityGuid,
    pub end2: EntityGuid,
    pub created_by: String,
    pub create_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_source: Option<String>,
}

impl Relationship {
    /// The end opposite to `guid`, if `guid` is one of the ends.
    pub fn other_end(&self, guid: &EntityGuid) -> Option<EntityGuid> {
        if self.end1 == *guid {
            Some(self.end2)
        } else if self.end2 == *guid {
            Some(self.end1)
        } else {
            None
        }
    }
}

/// Definition of a relationship type: its name and the entity types at each end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationshipTypeDef {
    pub name: &'static str,
    pub end1_type: &'static str,
    pub end2_type: &'static str,
}

/// Owning entity of a newly created entity, with the relationship type linking them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ownership {
    pub owner: EntityGuid,
    pub relationship_type: String,
}

impl Ownership {
    pub fn new(owner: EntityGuid, relationship_type: impl Into<String>) -> Self {
        Self {
            owner,
            relationship_type: relationship_type.into(),
        }
    }
}
