//! InMemoryExternalSourceRegistry - registered external sources kept in memory.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

use crate::domain::{ExternalSourceGuid, PortError, Result};
use crate::ports::{ExternalSourceResolver, IdGenerator, SystemClock, UlidGenerator};

struct RegisteredSource {
    guid: ExternalSourceGuid,
    /// `None` lets every user act on behalf of the source.
    authorized_users: Option<HashSet<String>>,
}

/// Resolver backed by an in-memory table of registered sources.
pub struct InMemoryExternalSourceRegistry {
    sources: RwLock<HashMap<String, RegisteredSource>>,
    ids: UlidGenerator<SystemClock>,
}

impl InMemoryExternalSourceRegistry {
    pub fn new() -> Self {
        Self {
            sources: RwLock::new(HashMap::new()),
            ids: UlidGenerator::new(SystemClock),
        }
    }

    /// Register a source open to every user. Registering an existing name
    /// keeps its identifier.
    pub async fn register(&self, qualified_name: impl Into<String>) -> ExternalSourceGuid {
        self.register_with_users(qualified_name, None).await
    }

    /// Register a source, restricting callers to `authorized_users` when given.
    pub async fn register_with_users(
        &self,
        qualified_name: impl Into<String>,
        authorized_users: Option<Vec<String>>,
    ) -> ExternalSourceGuid {
        let qualified_name = qualified_name.into();
        let authorized_users = authorized_users.map(|users| users.into_iter().collect());
        let mut sources = self.sources.write().await;
        match sources.get_mut(&qualified_name) {
            Some(existing) => {
                existing.authorized_users = authorized_users;
                existing.guid
            }
            None => {
                let guid = self.ids.generate_external_source_guid();
                tracing::info!(%guid, external_source = %qualified_name, "external source registered");
                sources.insert(
                    qualified_name,
                    RegisteredSource {
                        guid,
                        authorized_users,
                    },
                );
                guid
            }
        }
    }
}

impl Default for InMemoryExternalSourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExternalSourceResolver for InMemoryExternalSourceRegistry {
    async fn resolve(&self, user_id: &str, qualified_name: &str) -> Result<ExternalSourceGuid> {
        let sources = self.sources.read().await;
        let source = sources.get(qualified_name).ok_or_else(|| {
            PortError::server(format!("external source {qualified_name} is not registered"))
        })?;
        if let Some(users) = &source.authorized_users
            && !users.contains(user_id)
        {
            return Err(PortError::UserNotAuthorized {
                user_id: user_id.to_string(),
                action: format!("act on behalf of external source {qualified_name}"),
            });
        }
        Ok(source.guid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn registered_source_resolves() {
        let registry = InMemoryExternalSourceRegistry::new();
        let guid = registry.register("engine").await;

        assert_eq!(registry.resolve("anyone", "engine").await.unwrap(), guid);
    }

    #[tokio::test]
    async fn re_registering_keeps_identifier() {
        let registry = InMemoryExternalSourceRegistry::new();
        let first = registry.register("engine").await;
        let second = registry.register("engine").await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn unknown_source_is_a_server_failure() {
        let registry = InMemoryExternalSourceRegistry::new();
        let result = registry.resolve("user", "missing").await;
        assert!(matches!(result, Err(PortError::PropertyServer(_))));
    }

    #[tokio::test]
    async fn restricted_source_rejects_other_users() {
        let registry = InMemoryExternalSourceRegistry::new();
        registry
            .register_with_users("engine", Some(vec!["alice".to_string()]))
            .await;

        assert!(registry.resolve("alice", "engine").await.is_ok());
        let denied = registry.resolve("bob", "engine").await;
        assert!(matches!(
            denied,
            Err(PortError::UserNotAuthorized { ref user_id, .. }) if user_id == "bob"
        ));
    }
}
