//! JsonFileEntityStore - entity store persisted as a JSON snapshot on disk.
//!
//! Reads are served from memory. A mutation is applied to a copy of the
//! state, the copy is written through a temporary file and a rename, and only
//! then does it replace the in-memory state. A failed write leaves both the
//! file and the memory untouched.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::store_state::{StoreSnapshot, StoreState};
use crate::domain::{
    EntityDetail, EntityGuid, ExternalSource, InstanceProperties, Ownership, PortError,
    Relationship, RelationshipGuid, RelationshipTypeDef, Result,
};
use crate::ports::{Clock, EntityStore, IdGenerator, SystemClock, UlidGenerator};

pub struct JsonFileEntityStore {
    state: Mutex<StoreState>,
    ids: UlidGenerator<Arc<dyn Clock>>,
    clock: Arc<dyn Clock>,
    path: PathBuf,
}

impl JsonFileEntityStore {
    /// Open the store at `path`, starting empty when the file does not exist.
    /// The parent directory must exist.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_clock(path, Arc::new(SystemClock)).await
    }

    pub async fn open_with_clock(path: impl AsRef<Path>, clock: Arc<dyn Clock>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        ensure_parent_dir(&path).await?;

        let snapshot = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<StoreSnapshot>(&bytes).map_err(|e| {
                PortError::server(format!("corrupt store file {}: {e}", path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreSnapshot::default(),
            Err(e) => {
                return Err(PortError::server(format!(
                    "cannot read store file {}: {e}",
                    path.display()
                )));
            }
        };
        tracing::info!(
            path = %path.display(),
            entities = snapshot.entities.len(),
            relationships = snapshot.relationships.len(),
            "json entity store opened"
        );
        Ok(Self {
            state: Mutex::new(StoreState::from_snapshot(snapshot)),
            ids: UlidGenerator::new(clock.clone()),
            clock,
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn snapshot(&self) -> StoreSnapshot {
        self.state.lock().await.snapshot()
    }

    pub async fn relationships_of_type(&self, type_name: &str) -> Vec<Relationship> {
        self.state.lock().await.relationships_of_type(type_name)
    }

    /// Apply `mutate` to a copy of the state and keep the copy only once it is on disk.
    async fn commit<T, F>(&self, mutate: F) -> Result<T>
    where
        T: Send,
        F: FnOnce(&mut StoreState) -> Result<T> + Send,
    {
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        let value = mutate(&mut next)?;
        self.persist(&next.snapshot()).await?;
        *state = next;
        Ok(value)
    }

    async fn persist(&self, snapshot: &StoreSnapshot) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| PortError::server(format!("cannot encode store snapshot: {e}")))?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| PortError::server(format!("cannot write {}: {e}", tmp.display())))?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(PortError::server(format!(
                "cannot replace {}: {e}",
                self.path.display()
            )));
        }
        Ok(())
    }
}

async fn ensure_parent_dir(path: &Path) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => return Ok(()),
    };
    match tokio::fs::metadata(parent).await {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(PortError::server(format!(
            "store directory {} is not a directory",
            parent.display()
        ))),
        Err(e) => Err(PortError::server(format!(
            "store directory {} is not usable: {e}",
            parent.display()
        ))),
    }
}

#[async_trait]
impl EntityStore for JsonFileEntityStore {
    async fn create_entity(
        &self,
        user_id: &str,
        source: &ExternalSource,
        type_name: &str,
        properties: InstanceProperties,
        owner: Option<&Ownership>,
    ) -> Result<EntityGuid> {
        let now = self.clock.now();
        let ids = &self.ids as &dyn IdGenerator;
        let guid = self
            .commit(|state| {
                state.create_entity(ids, now, user_id, source, type_name, properties, owner)
            })
            .await?;
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
        let now = self.clock.now();
        self.commit(|state| {
            state.update_entity(now, user_id, source, guid, type_name, properties)
        })
        .await?;
        tracing::debug!(%guid, type_name, user_id, "entity updated");
        Ok(())
    }

    async fn delete_entity(
        &self,
        user_id: &str,
        _source: &ExternalSource,
        guid: &EntityGuid,
    ) -> Result<()> {
        let cascaded = self.commit(|state| state.delete_entity(guid)).await?;
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
        let now = self.clock.now();
        let ids = &self.ids as &dyn IdGenerator;
        let (guid, created) = self
            .commit(|state| {
                state.create_relationship(ids, now, user_id, source, from, to, relationship_type)
            })
            .await?;
        if created {
            tracing::debug!(%guid, %from, %to, relationship_type, "relationship created");
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
