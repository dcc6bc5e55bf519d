//! ManagerBuilder - wiring of a [`PortManager`] and its collaborators.
//!
//! Missing collaborators are reported at build time rather than on first use.

use std::sync::Arc;

use super::port_manager::PortManager;
use crate::config::{PortlinkConfig, StoreConfig};
use crate::domain::PortError;
use crate::impls::{InMemoryEntityStore, InMemoryExternalSourceRegistry, JsonFileEntityStore};
use crate::ports::{EntityStore, ExternalSourceResolver};

/// Builds a [`PortManager`].
///
/// # Example
/// ```ignore
/// let manager = ManagerBuilder::new()
///     .store(Arc::new(InMemoryEntityStore::new()))
///     .resolver(Arc::new(registry))
///     .build()?;
/// ```
#[derive(Default)]
pub struct ManagerBuilder {
    store: Option<Arc<dyn EntityStore>>,
    resolver: Option<Arc<dyn ExternalSourceResolver>>,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("no entity store was configured")]
    MissingStore,

    #[error("no external source resolver was configured")]
    MissingResolver,

    #[error("cannot open entity store: {0}")]
    Store(#[from] PortError),
}

impl ManagerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(mut self, store: Arc<dyn EntityStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn resolver(mut self, resolver: Arc<dyn ExternalSourceResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn build(self) -> Result<PortManager, BuildError> {
        let store = self.store.ok_or(BuildError::MissingStore)?;
        let resolver = self.resolver.ok_or(BuildError::MissingResolver)?;
        Ok(PortManager::new(store, resolver))
    }

    /// Wire the store backend and the external source registry described by `config`.
    pub async fn from_config(config: &PortlinkConfig) -> Result<PortManager, BuildError> {
        let store: Arc<dyn EntityStore> = match &config.store {
            StoreConfig::Memory => Arc::new(InMemoryEntityStore::new()),
            StoreConfig::JsonFile { path } => Arc::new(JsonFileEntityStore::open(path).await?),
        };

        let registry = InMemoryExternalSourceRegistry::new();
        for source in &config.external_sources {
            registry
                .register_with_users(&source.qualified_name, source.authorized_users.clone())
                .await;
        }

        tracing::info!(
            store = ?config.store,
            external_sources = config.external_sources.len(),
            "port manager wired"
        );
        Self::new().store(store).resolver(Arc::new(registry)).build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExternalSourceConfig;
    use crate::domain::types::{PROCESS_TYPE_NAME, QUALIFIED_NAME_PROPERTY_NAME};
    use crate::domain::{
        ExternalSource, ExternalSourceGuid, InstanceProperties, Port, PortKind, PortType,
        PropertyValue,
    };

    #[test]
    fn build_without_store_fails() {
        let result = ManagerBuilder::new()
            .resolver(Arc::new(InMemoryExternalSourceRegistry::new()))
            .build();
        assert!(matches!(result, Err(BuildError::MissingStore)));
    }

    #[test]
    fn build_without_resolver_fails() {
        let result = ManagerBuilder::new()
            .store(Arc::new(InMemoryEntityStore::new()))
            .build();
        assert!(matches!(result, Err(BuildError::MissingResolver)));
    }

    #[test]
    fn build_with_both_succeeds() {
        let result = ManagerBuilder::new()
            .store(Arc::new(InMemoryEntityStore::new()))
            .resolver(Arc::new(InMemoryExternalSourceRegistry::new()))
            .build();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn from_config_registers_sources_and_opens_json_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = PortlinkConfig {
            user_id: "steward".to_string(),
            log_filter: "info".to_string(),
            store: StoreConfig::JsonFile {
                path: dir.path().join("store.json"),
            },
            external_sources: vec![ExternalSourceConfig {
                qualified_name: "engine".to_string(),
                authorized_users: Some(vec!["steward".to_string()]),
            }],
            lineage: None,
        };

        let manager = ManagerBuilder::from_config(&config).await.unwrap();
        let source = ExternalSource {
            guid: ExternalSourceGuid::from_ulid(ulid::Ulid::new()),
            qualified_name: "engine".to_string(),
        };
        let mut properties = InstanceProperties::new();
        properties.insert(
            QUALIFIED_NAME_PROPERTY_NAME.to_string(),
            PropertyValue::String("process".to_string()),
        );
        let process = manager
            .store()
            .create_entity("steward", &source, PROCESS_TYPE_NAME, properties, None)
            .await
            .unwrap();
        let port = Port::new("port", "port", PortType::InputPort);

        manager
            .create_port("steward", &port, PortKind::Implementation, &process, "engine")
            .await
            .unwrap();
        let denied = manager
            .create_port("intruder", &port, PortKind::Alias, &process, "engine")
            .await;

        assert!(matches!(denied, Err(PortError::UserNotAuthorized { .. })));
        assert!(dir.path().join("store.json").exists());
    }

    #[tokio::test]
    async fn from_config_reports_corrupt_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "[").unwrap();
        let config = PortlinkConfig {
            user_id: "steward".to_string(),
            log_filter: "info".to_string(),
            store: StoreConfig::JsonFile { path },
            external_sources: Vec::new(),
            lineage: None,
        };

        let result = ManagerBuilder::from_config(&config).await;
        assert!(matches!(result, Err(BuildError::Store(PortError::PropertyServer(_)))));
    }
}
