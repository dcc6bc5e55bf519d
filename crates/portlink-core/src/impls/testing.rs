//! Instrumented collaborators for tests: count store mutations and resolutions.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{InMemoryEntityStore, InMemoryExternalSourceRegistry};
use crate::domain::{
    EntityDetail, EntityGuid, ExternalSource, ExternalSourceGuid, InstanceProperties, Ownership,
    PortError, Relationship, RelationshipGuid, RelationshipTypeDef, Result,
};
use crate::ports::{EntityStore, ExternalSourceResolver};

/// In-memory store that counts every mutating call it receives.
#[derive(Default)]
pub struct CountingStore {
    pub inner: InMemoryEntityStore,
    mutations: AtomicUsize,
}

impl CountingStore {
    pub fn mutations(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    fn record(&self) {
        self.mutations.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl EntityStore for CountingStore {
    async fn create_entity(
        &self,
        user_id: &str,
        source: &ExternalSource,
        type_name: &str,
        properties: InstanceProperties,
        owner: Option<&Ownership>,
    ) -> Result<EntityGuid> {
        self.record();
        self.inner
            .create_entity(user_id, source, type_name, properties, owner)
            .await
    }

    async fn update_entity(
        &self,
        user_id: &str,
        source: &ExternalSource,
        guid: &EntityGuid,
        type_name: &str,
        properties: InstanceProperties,
    ) -> Result<()> {
        self.record();
        self.inner
            .update_entity(user_id, source, guid, type_name, properties)
            .await
    }

    async fn delete_entity(
        &self,
        user_id: &str,
        source: &ExternalSource,
        guid: &EntityGuid,
    ) -> Result<()> {
        self.record();
        self.inner.delete_entity(user_id, source, guid).await
    }

    async fn get_entity(&self, user_id: &str, guid: &EntityGuid) -> Result<Option<EntityDetail>> {
        self.inner.get_entity(user_id, guid).await
    }

    async fn find_entity_by_qualified_name(
        &self,
        user_id: &str,
        qualified_name: &str,
        type_name: &str,
    ) -> Result<Option<EntityDetail>> {
        self.inner
            .find_entity_by_qualified_name(user_id, qualified_name, type_name)
            .await
    }

    async fn relationship_exists(
        &self,
        user_id: &str,
        from: &EntityGuid,
        to: &EntityGuid,
        from_type_name: &str,
        relationship_type: &str,
    ) -> Result<Option<Relationship>> {
        self.inner
            .relationship_exists(user_id, from, to, from_type_name, relationship_type)
            .await
    }

    async fn create_relationship(
        &self,
        user_id: &str,
        source: &ExternalSource,
        from: &EntityGuid,
        to: &EntityGuid,
        relationship_type: &str,
    ) -> Result<RelationshipGuid> {
        self.record();
        self.inner
            .create_relationship(user_id, source, from, to, relationship_type)
            .await
    }

    async fn relationship_type(&self, user_id: &str, name: &str) -> Result<RelationshipTypeDef> {
        self.inner.relationship_type(user_id, name).await
    }

    async fn traverse_relationship(
        &self,
        user_id: &str,
        from: &EntityGuid,
        from_type_name: &str,
        relationship_type: &RelationshipTypeDef,
    ) -> Result<Option<EntityDetail>> {
        self.inner
            .traverse_relationship(user_id, from, from_type_name, relationship_type)
            .await
    }
}

/// Registry that counts resolutions.
#[derive(Default)]
pub struct CountingResolver {
    pub inner: InMemoryExternalSourceRegistry,
    calls: AtomicUsize,
}

impl CountingResolver {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExternalSourceResolver for CountingResolver {
    async fn resolve(&self, user_id: &str, qualified_name: &str) -> Result<ExternalSourceGuid> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.resolve(user_id, qualified_name).await
    }
}

/// Resolver that refuses every caller.
pub struct DenyingResolver;

#[async_trait]
impl ExternalSourceResolver for DenyingResolver {
    async fn resolve(&self, user_id: &str, qualified_name: &str) -> Result<ExternalSourceGuid> {
        Err(PortError::UserNotAuthorized {
            user_id: user_id.to_string(),
            action: format!("act on behalf of external source {qualified_name}"),
        })
    }
}
