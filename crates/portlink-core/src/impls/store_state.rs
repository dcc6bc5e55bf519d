//! Entity/relationship state shared by the provided stores.
//!
//! All rules the stores enforce live here, synchronously, so the async
//! wrappers only add locking and (for the file store) persistence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::types::{QUALIFIED_NAME_PROPERTY_NAME, is_type_of, relationship_type_def};
use crate::domain::{
    EntityDetail, EntityGuid, ExternalSource, InstanceProperties, Ownership, PortError,
    PropertyValue, Relationship, RelationshipGuid, RelationshipTypeDef, Result,
};
use crate::ports::IdGenerator;

/// Serializable image of a store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub entities: Vec<EntityDetail>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct StoreState {
    entities: HashMap<EntityGuid, EntityDetail>,
    relationships: HashMap<RelationshipGuid, Relationship>,
}

impl StoreState {
    pub(crate) fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            entities: snapshot
                .entities
                .into_iter()
                .map(|entity| (entity.guid, entity))
                .collect(),
            relationships: snapshot
                .relationships
                .into_iter()
                .map(|relationship| (relationship.guid, relationship))
                .collect(),
        }
    }

    /// Snapshot ordered by GUID, so equal states serialize identically.
    pub(crate) fn snapshot(&self) -> StoreSnapshot {
        let mut entities: Vec<EntityDetail> = self.entities.values().cloned().collect();
        entities.sort_by_key(|entity| entity.guid);
        let mut relationships: Vec<Relationship> = self.relationships.values().cloned().collect();
        relationships.sort_by_key(|relationship| relationship.guid);
        StoreSnapshot {
            entities,
            relationships,
        }
    }

    pub(crate) fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub(crate) fn relationships_of_type(&self, type_name: &str) -> Vec<Relationship> {
        let mut found: Vec<Relationship> = self
            .relationships
            .values()
            .filter(|relationship| relationship.type_name == type_name)
            .cloned()
            .collect();
        found.sort_by_key(|relationship| relationship.guid);
        found
    }

    fn entity(&self, guid: &EntityGuid) -> Result<&EntityDetail> {
        self.entities
            .get(guid)
            .ok_or_else(|| PortError::server(format!("entity {guid} not found")))
    }

    fn entity_of_type(&self, guid: &EntityGuid, type_name: &str) -> Result<&EntityDetail> {
        let entity = self.entity(guid)?;
        if !is_type_of(&entity.type_name, type_name) {
            return Err(PortError::server(format!(
                "entity {guid} is a {} and not a {type_name}",
                entity.type_name
            )));
        }
        Ok(entity)
    }

    fn known_relationship_type(name: &str) -> Result<RelationshipTypeDef> {
        relationship_type_def(name)
            .ok_or_else(|| PortError::server(format!("unknown relationship type {name}")))
    }

    fn qualified_name_taken(
        &self,
        type_name: &str,
        qualified_name: &str,
        except: Option<&EntityGuid>,
    ) -> bool {
        self.entities.values().any(|entity| {
            entity.type_name == type_name
                && entity.qualified_name() == Some(qualified_name)
                && Some(&entity.guid) != except
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn create_entity(
        &mut self,
        ids: &dyn IdGenerator,
        now: DateTime<Utc>,
        user_id: &str,
        source: &ExternalSource,
        type_name: &str,
        properties: InstanceProperties,
        owner: Option<&Ownership>,
    ) -> Result<EntityGuid> {
        let guid = ids.generate_entity_guid();
        let entity = EntityDetail {
            guid,
            type_name: type_name.to_string(),
            properties,
            created_by: user_id.to_string(),
            updated_by: None,
            create_time: now,
            update_time: None,
            version: 1,
            external_source: Some(source.qualified_name.clone()),
        };

        if let Some(qualified_name) = entity.qualified_name()
            && self.qualified_name_taken(type_name, qualified_name, None)
        {
            return Err(PortError::server(format!(
                "an entity of type {type_name} with qualified name {qualified_name} already exists"
            )));
        }

        let ownership = match owner {
            Some(owner) => {
                let def = Self::known_relationship_type(&owner.relationship_type)?;
                self.entity_of_type(&owner.owner, def.end1_type)?;
                if !is_type_of(type_name, def.end2_type) {
                    return Err(PortError::server(format!(
                        "a {type_name} cannot be owned through {}",
                        def.name
                    )));
                }
                Some(Relationship {
                    guid: ids.generate_relationship_guid(),
                    type_name: def.name.to_string(),
                    end1: owner.owner,
                    end2: guid,
                    created_by: user_id.to_string(),
                    create_time: now,
                    external_source: Some(source.qualified_name.clone()),
                })
            }
            None => None,
        };

        self.entities.insert(guid, entity);
        if let Some(relationship) = ownership {
            self.relationships.insert(relationship.guid, relationship);
        }
        Ok(guid)
    }

    pub(crate) fn update_entity(
        &mut self,
        now: DateTime<Utc>,
        user_id: &str,
        source: &ExternalSource,
        guid: &EntityGuid,
        type_name: &str,
        properties: InstanceProperties,
    ) -> Result<()> {
        let stored_type = self.entity(guid)?.type_name.clone();
        if stored_type != type_name {
            return Err(PortError::server(format!(
                "entity {guid} is a {stored_type} and not a {type_name}"
            )));
        }

        if let Some(qualified_name) = properties
            .get(QUALIFIED_NAME_PROPERTY_NAME)
            .and_then(PropertyValue::as_str)
            && self.qualified_name_taken(type_name, qualified_name, Some(guid))
        {
            return Err(PortError::server(format!(
                "an entity of type {type_name} with qualified name {qualified_name} already exists"
            )));
        }

        let entity = self
            .entities
            .get_mut(guid)
            .ok_or_else(|| PortError::server(format!("entity {guid} not found")))?;
        entity.properties = properties;
        entity.updated_by = Some(user_id.to_string());
        entity.update_time = Some(now);
        entity.version += 1;
        entity.external_source = Some(source.qualified_name.clone());
        Ok(())
    }

    /// Removes the entity and returns how many relationships went with it.
    pub(crate) fn delete_entity(&mut self, guid: &EntityGuid) -> Result<usize> {
        if self.entities.remove(guid).is_none() {
            return Err(PortError::server(format!("entity {guid} not found")));
        }
        let before = self.relationships.len();
        self.relationships
            .retain(|_, relationship| relationship.other_end(guid).is_none());
        Ok(before - self.relationships.len())
    }

    pub(crate) fn get_entity(&self, guid: &EntityGuid) -> Option<EntityDetail> {
        self.entities.get(guid).cloned()
    }

    pub(crate) fn find_entity_by_qualified_name(
        &self,
        qualified_name: &str,
        type_name: &str,
    ) -> Option<EntityDetail> {
        self.entities
            .values()
            .find(|entity| {
                entity.type_name == type_name && entity.qualified_name() == Some(qualified_name)
            })
            .cloned()
    }

    pub(crate) fn relationship_exists(
        &self,
        from: &EntityGuid,
        to: &EntityGuid,
        from_type_name: &str,
        relationship_type: &str,
    ) -> Result<Option<Relationship>> {
        if self.entities.contains_key(from) {
            self.entity_of_type(from, from_type_name)?;
        }
        Ok(self.find_relationship(from, to, relationship_type).cloned())
    }

    fn find_relationship(
        &self,
        from: &EntityGuid,
        to: &EntityGuid,
        relationship_type: &str,
    ) -> Option<&Relationship> {
        self.relationships.values().find(|relationship| {
            relationship.type_name == relationship_type
                && relationship.end1 == *from
                && relationship.end2 == *to
        })
    }

    /// Returns the GUID of the edge and whether it was newly recorded.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn create_relationship(
        &mut self,
        ids: &dyn IdGenerator,
        now: DateTime<Utc>,
        user_id: &str,
        source: &ExternalSource,
        from: &EntityGuid,
        to: &EntityGuid,
        relationship_type: &str,
    ) -> Result<(RelationshipGuid, bool)> {
        let def = Self::known_relationship_type(relationship_type)?;
        self.entity_of_type(from, def.end1_type)?;
        self.entity_of_type(to, def.end2_type)?;

        if let Some(existing) = self.find_relationship(from, to, def.name) {
            return Ok((existing.guid, false));
        }

        let relationship = Relationship {
            guid: ids.generate_relationship_guid(),
            type_name: def.name.to_string(),
            end1: *from,
            end2: *to,
            created_by: user_id.to_string(),
            create_time: now,
            external_source: Some(source.qualified_name.clone()),
        };
        let guid = relationship.guid;
        self.relationships.insert(guid, relationship);
        Ok((guid, true))
    }

    pub(crate) fn relationship_type(&self, name: &str) -> Result<RelationshipTypeDef> {
        Self::known_relationship_type(name)
    }

    pub(crate) fn traverse_relationship(
        &self,
        from: &EntityGuid,
        from_type_name: &str,
        relationship_type: &RelationshipTypeDef,
    ) -> Result<Option<EntityDetail>> {
        self.entity_of_type(from, from_type_name)?;

        let mut connected = self
            .relationships
            .values()
            .filter(|relationship| relationship.type_name == relationship_type.name)
            .filter_map(|relationship| relationship.other_end(from));

        let Some(other) = connected.next() else {
            return Ok(None);
        };
        if connected.next().is_some() {
            return Err(PortError::server(format!(
                "entity {from} has more than one {} relationship",
                relationship_type.name
            )));
        }
        self.entity(&other).cloned().map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{
        PORT_IMPLEMENTATION_TYPE_NAME, PORT_SCHEMA_RELATIONSHIP_TYPE_NAME, PROCESS_PORT_TYPE_NAME,
        PROCESS_TYPE_NAME, SCHEMA_TYPE_TYPE_NAME,
    };
    use crate::domain::ExternalSourceGuid;
    use crate::ports::{SystemClock, UlidGenerator};
    use ulid::Ulid;

    fn source() -> ExternalSource {
        ExternalSource {
            guid: ExternalSourceGuid::from_ulid(Ulid::new()),
            qualified_name: "engine".to_string(),
        }
    }

    fn named(qualified_name: &str) -> InstanceProperties {
        let mut properties = InstanceProperties::new();
        properties.insert(
            QUALIFIED_NAME_PROPERTY_NAME.to_string(),
            PropertyValue::String(qualified_name.to_string()),
        );
        properties
    }

    #[test]
    fn duplicate_qualified_name_is_rejected_per_type() {
        let ids = UlidGenerator::new(SystemClock);
        let mut state = StoreState::default();
        let src = source();

        state
            .create_entity(&ids, Utc::now(), "u", &src, PROCESS_TYPE_NAME, named("p"), None)
            .unwrap();
        let dup = state.create_entity(&ids, Utc::now(), "u", &src, PROCESS_TYPE_NAME, named("p"), None);
        assert!(matches!(dup, Err(PortError::PropertyServer(_))));

        // same name under another type is fine
        state
            .create_entity(&ids, Utc::now(), "u", &src, SCHEMA_TYPE_TYPE_NAME, named("p"), None)
            .unwrap();
        assert_eq!(state.entity_count(), 2);
    }

    #[test]
    fn ownership_requires_matching_end_types() {
        let ids = UlidGenerator::new(SystemClock);
        let mut state = StoreState::default();
        let src = source();

        let schema = state
            .create_entity(&ids, Utc::now(), "u", &src, SCHEMA_TYPE_TYPE_NAME, named("s"), None)
            .unwrap();
        let owner = Ownership::new(schema, PROCESS_PORT_TYPE_NAME);
        let result = state.create_entity(
            &ids,
            Utc::now(),
            "u",
            &src,
            PORT_IMPLEMENTATION_TYPE_NAME,
            named("port"),
            Some(&owner),
        );
        assert!(matches!(result, Err(PortError::PropertyServer(_))));
        assert_eq!(state.entity_count(), 1);
    }

    #[test]
    fn relationship_creation_is_idempotent() {
        let ids = UlidGenerator::new(SystemClock);
        let mut state = StoreState::default();
        let src = source();

        let process = state
            .create_entity(&ids, Utc::now(), "u", &src, PROCESS_TYPE_NAME, named("p"), None)
            .unwrap();
        let port = state
            .create_entity(
                &ids,
                Utc::now(),
                "u",
                &src,
                PORT_IMPLEMENTATION_TYPE_NAME,
                named("port"),
                Some(&Ownership::new(process, PROCESS_PORT_TYPE_NAME)),
            )
            .unwrap();
        let schema = state
            .create_entity(&ids, Utc::now(), "u", &src, SCHEMA_TYPE_TYPE_NAME, named("s"), None)
            .unwrap();

        let (first, created) = state
            .create_relationship(&ids, Utc::now(), "u", &src, &port, &schema, PORT_SCHEMA_RELATIONSHIP_TYPE_NAME)
            .unwrap();
        assert!(created);
        let (second, created) = state
            .create_relationship(&ids, Utc::now(), "u", &src, &port, &schema, PORT_SCHEMA_RELATIONSHIP_TYPE_NAME)
            .unwrap();
        assert!(!created);
        assert_eq!(first, second);
        assert_eq!(state.relationships_of_type(PORT_SCHEMA_RELATIONSHIP_TYPE_NAME).len(), 1);
    }

    #[test]
    fn delete_cascades_relationships() {
        let ids = UlidGenerator::new(SystemClock);
        let mut state = StoreState::default();
        let src = source();

        let process = state
            .create_entity(&ids, Utc::now(), "u", &src, PROCESS_TYPE_NAME, named("p"), None)
            .unwrap();
        let port = state
            .create_entity(
                &ids,
                Utc::now(),
                "u",
                &src,
                PORT_IMPLEMENTATION_TYPE_NAME,
                named("port"),
                Some(&Ownership::new(process, PROCESS_PORT_TYPE_NAME)),
            )
            .unwrap();

        assert_eq!(state.delete_entity(&port).unwrap(), 1);
        assert!(state.relationships_of_type(PROCESS_PORT_TYPE_NAME).is_empty());
        assert!(state.delete_entity(&port).is_err());
    }

    #[test]
    fn snapshot_roundtrip_preserves_state() {
        let ids = UlidGenerator::new(SystemClock);
        let mut state = StoreState::default();
        let src = source();
        state
            .create_entity(&ids, Utc::now(), "u", &src, PROCESS_TYPE_NAME, named("p"), None)
            .unwrap();

        let snapshot = state.snapshot();
        let restored = StoreState::from_snapshot(snapshot.clone());
        assert_eq!(restored.snapshot(), snapshot);
    }
}
