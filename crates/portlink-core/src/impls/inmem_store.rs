//! InMemoryEntityStore - process-local metadata store for development and tests.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::store_state::{StoreSnapshot, StoreState};
use crate::domain::{
    EntityDetail, EntityGuid, ExternalSource, InstanceProperties, Ownership, Relationship,
    RelationshipGuid, RelationshipTypeDef, Result,
};
use crate::ports::{Clock, EntityStore, IdGenerator, SystemClock, UlidGenerator};

/// Entity store kept entirely in memory.
///
/// A single `tokio::sync::Mutex` serializes all access, which makes the
/// uniqueness checks in `create_entity` and `create_relationship` atomic.
pub struct InMemoryEntityStore {
    state: Mutex<StoreState>,
    ids: UlidGenerator<Arc<dyn Clock>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self::from_snapshot(StoreSnapshot::default(), clock)
    }

    pub fn from_snapshot(snapshot: StoreSnapshot, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(StoreState::from_snapshot(snapshot)),
            ids: UlidGenerator::new(clock.clone()),
            clock,
        }
    }

    pub async fn snapshot(&self) -> StoreSnapshot {
        self.state.lock().await.snapshot()
    }

    pub async fn entity_count(&self) -> usize {
        self.state.lock().await.entity_count()
    }

    /// All stored relationships of `type_name`, ordered by GUID.
    pub async fn relationships_of_type(&self, type_name: &str) -> Vec<Relationship> {
        self.state.lock().await.relationships_of_type(type_name)
    }
}

impl Default for InMemoryEntityStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn create_entity(
        &self,
        user_id: &str,
        source: &ExternalSource,
        type_name: &str,
        properties: InstanceProperties,
        owner: Option<&Ownership>,
    ) -> Result<EntityGuid> {
        let guid = self.state.lock().await.create_entity(
            &self.ids as &dyn IdGenerator,
            self.clock.now(),
            user_id,
            source,
            type_name,
            properties,
            owner,
        )?;
        tracing::debug!(%guid, type_name, user_id, "entity created");
        Ok(guid)
    }

    async fn update_entity(
        &self,
        user_id: &str,
        source: &ExternalSource,
        guid: &EntityGuid,
        type_name: &str,
        properties: InstanceProperties,
    ) -> Result<()> {
        self.state.lock().await.update_entity(
            self.clock.now(),
            user_id,
            source,
            guid,
            type_name,
            properties,
        )?;
        tracing::debug!(%guid, type_name, user_id, "entity updated");
        Ok(())
    }

    async fn delete_entity(
        &self,
        user_id: &str,
        _source: &ExternalSource,
        guid: &EntityGuid,
    ) -> Result<()> {
        let cascaded = self.state.lock().await.delete_entity(guid)?;
        tracing::debug!(%guid, user_id, cascaded, "entity deleted");
        Ok(())
    }

    async fn get_entity(&self, _user_id: &str, guid: &EntityGuid) -> Result<Option<EntityDetail>> {
        Ok(self.state.lock().await.get_entity(guid))
    }

    async fn find_entity_by_qualified_name(
        &self,
        _user_id: &str,
        qualified_name: &str,
        type_name: &str,
    ) -> Result<Option<EntityDetail>> {
        Ok(self
            .state
            .lock()
            .await
            .find_entity_by_qualified_name(qualified_name, type_name))
    }

    async fn relationship_exists(
        &self,
        _user_id: &str,
        from: &EntityGuid,
        to: &EntityGuid,
        from_type_name: &str,
        relationship_type: &str,
    ) -> Result<Option<Relationship>> {
        self.state
            .lock()
            .await
            .relationship_exists(from, to, from_type_name, relationship_type)
    }

    async fn create_relationship(
        &self,
        user_id: &str,
        source: &ExternalSource,
        from: &EntityGuid,
        to: &EntityGuid,
        relationship_type: &str,
    ) -> Result<RelationshipGuid> {
        let (guid, created) = self.state.lock().await.create_relationship(
            &self.ids as &dyn IdGenerator,
            self.clock.now(),
            user_id,
            source,
            from,
            to,
            relationship_type,
        )?;
        if created {
            tracing::debug!(%guid, %from, %to, relationship_type, "relationship created");
        } else {
            tracing::debug!(%guid, %from, %to, relationship_type, "relationship already present");
        }
        Ok(guid)
    }

    async fn relationship_type(&self, _user_id: &str, name: &str) -> Result<RelationshipTypeDef> {
        self.state.lock().await.relationship_type(name)
    }

    async fn traverse_relationship(
        &self,
        _user_id: &str,
        from: &EntityGuid,
        from_type_name: &str,
        relationship_type: &RelationshipTypeDef,
    ) -> Result<Option<EntityDetail>> {
        self.state
            .lock()
            .await
            .traverse_relationship(from, from_type_name, relationship_type)
    }
}
