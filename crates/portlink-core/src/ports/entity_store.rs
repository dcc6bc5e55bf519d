//! EntityStore port - the metadata repository holding entities and relationships.
//!
//! The port manager never talks to a concrete repository; it only sees this
//! trait. Implementations live in `impls` (in-memory, JSON file) or in
//! adapters to a real metadata server.

use async_trait::async_trait;

use crate::domain::{
    EntityDetail, EntityGuid, ExternalSource, InstanceProperties, Ownership, Relationship,
    RelationshipGuid, RelationshipTypeDef, Result,
};

/// Create/update/find/delete of typed entities and relationships.
///
/// # Consistency contract
/// Callers run check-then-act sequences (look up, then create) that are not
/// atomic on their side. The store is where uniqueness is enforced:
/// - `create_entity` rejects a second entity of the same type with the same
///   qualified name
/// - `create_relationship` is idempotent per (type, end1, end2): creating an
///   existing edge returns its GUID and records nothing new
/// - a mutation that returns an error leaves no trace, in memory or on disk
///
/// Stores must not retry internally on behalf of callers in a way that
/// changes these outcomes; timeout and retry policy belongs here, not in the
/// manager.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Create an entity, optionally linked to an owning entity.
    async fn create_entity(
        &self,
        user_id: &str,
        source: &ExternalSource,
        type_name: &str,
        properties: InstanceProperties,
        owner: Option<&Ownership>,
    ) -> Result<EntityGuid>;

    /// Replace the properties of an existing entity of `type_name`.
    async fn update_entity(
        &self,
        user_id: &str,
        source: &ExternalSource,
        guid: &EntityGuid,
        type_name: &str,
        properties: InstanceProperties,
    ) -> Result<()>;

    /// Delete an entity together with every relationship touching it.
    async fn delete_entity(
        &self,
        user_id: &str,
        source: &ExternalSource,
        guid: &EntityGuid,
    ) -> Result<()>;

    async fn get_entity(&self, user_id: &str, guid: &EntityGuid) -> Result<Option<EntityDetail>>;

    /// Unique lookup by qualified name, scoped to exactly `type_name`.
    async fn find_entity_by_qualified_name(
        &self,
        user_id: &str,
        qualified_name: &str,
        type_name: &str,
    ) -> Result<Option<EntityDetail>>;

    /// True when `candidate` differs from the stored properties of `original`.
    fn diff_properties(&self, original: &EntityDetail, candidate: &InstanceProperties) -> bool {
        original.properties != *candidate
    }

    /// The relationship of `relationship_type` from `from` to `to`, if any.
    /// `from` must be an entity of `from_type_name` or one of its subtypes.
    async fn relationship_exists(
        &self,
        user_id: &str,
        from: &EntityGuid,
        to: &EntityGuid,
        from_type_name: &str,
        relationship_type: &str,
    ) -> Result<Option<Relationship>>;

    async fn create_relationship(
        &self,
        user_id: &str,
        source: &ExternalSource,
        from: &EntityGuid,
        to: &EntityGuid,
        relationship_type: &str,
    ) -> Result<RelationshipGuid>;

    /// Look up a relationship type definition by name.
    async fn relationship_type(&self, user_id: &str, name: &str) -> Result<RelationshipTypeDef>;

    /// The entity at the other end of the single `relationship_type` edge of
    /// `from`. `Ok(None)` when no such edge exists.
    async fn traverse_relationship(
        &self,
        user_id: &str,
        from: &EntityGuid,
        from_type_name: &str,
        relationship_type: &RelationshipTypeDef,
    ) -> Result<Option<EntityDetail>>;
}
