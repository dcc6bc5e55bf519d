//! PortManager - creation, update, linking and removal of ports.
//!
//! The manager owns the business rules; storage and external-source lookup are
//! reached only through the [`EntityStore`] and [`ExternalSourceResolver`]
//! ports.
//!
//! # Concurrency
//! The manager keeps no state between calls. Every qualified name is resolved
//! to a GUID afresh on each call, so one manager can be shared by any number
//! of tasks without locking. The look-up-then-create sequences below are not
//! atomic here; uniqueness under concurrency is the store's job (see the
//! consistency contract on [`EntityStore`]).

use std::sync::Arc;

use super::mapper::{port_properties, stored_port_type};
use super::validation::{validate_name, validate_user_id};
use crate::domain::types::{
    PORT_ALIAS_TYPE_NAME, PORT_DELEGATION_TYPE_NAME, PORT_IMPLEMENTATION_TYPE_NAME,
    PORT_SCHEMA_RELATIONSHIP_TYPE_NAME, PORT_TYPE_NAME, PROCESS_PORT_TYPE_NAME,
};
use crate::domain::{
    EntityDetail, EntityGuid, ExternalSource, Ownership, Port, PortAlias, PortError,
    PortImplementation, PortKind, PortType, Result,
};
use crate::ports::{EntityStore, ExternalSourceResolver};

const QUALIFIED_NAME_PARAMETER_NAME: &str = "qualifiedName";
const DISPLAY_NAME_PARAMETER_NAME: &str = "displayName";
const DELEGATES_TO_PARAMETER_NAME: &str = "delegatesTo";

/// Result of [`PortManager::update_port`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortUpdate {
    /// Stored properties already matched; nothing was written.
    Unchanged,
    Updated,
}

/// Port relationship manager.
#[derive(Clone)]
pub struct PortManager {
    store: Arc<dyn EntityStore>,
    resolver: Arc<dyn ExternalSourceResolver>,
}

impl PortManager {
    pub fn new(store: Arc<dyn EntityStore>, resolver: Arc<dyn ExternalSourceResolver>) -> Self {
        Self { store, resolver }
    }

    pub fn store(&self) -> &Arc<dyn EntityStore> {
        &self.store
    }

    pub fn resolver(&self) -> &Arc<dyn ExternalSourceResolver> {
        &self.resolver
    }

    async fn external_source(&self, user_id: &str, qualified_name: &str) -> Result<ExternalSource> {
        let guid = self.resolver.resolve(user_id, qualified_name).await?;
        Ok(ExternalSource {
            guid,
            qualified_name: qualified_name.to_string(),
        })
    }

    pub async fn create_port_implementation(
        &self,
        user_id: &str,
        port_implementation: &PortImplementation,
        process_guid: &EntityGuid,
        external_source_name: &str,
    ) -> Result<EntityGuid> {
        self.create_port(
            user_id,
            &port_implementation.port,
            PortKind::Implementation,
            process_guid,
            external_source_name,
        )
        .await
    }

    pub async fn create_port_alias(
        &self,
        user_id: &str,
        port_alias: &PortAlias,
        process_guid: &EntityGuid,
        external_source_name: &str,
    ) -> Result<EntityGuid> {
        self.create_port(
            user_id,
            &port_alias.port,
            PortKind::Alias,
            process_guid,
            external_source_name,
        )
        .await
    }

    /// Create a port entity of `kind` owned by the process `process_guid`.
    pub async fn create_port(
        &self,
        user_id: &str,
        port: &Port,
        kind: PortKind,
        process_guid: &EntityGuid,
        external_source_name: &str,
    ) -> Result<EntityGuid> {
        const ACTION: &str = "create_port";
        validate_port_parameters(user_id, port, ACTION)?;

        let source = self.external_source(user_id, external_source_name).await?;
        let owner = Ownership::new(*process_guid, PROCESS_PORT_TYPE_NAME);
        let guid = self
            .store
            .create_entity(
                user_id,
                &source,
                kind.type_name(),
                port_properties(port),
                Some(&owner),
            )
            .await?;

        tracing::info!(
            %guid,
            qualified_name = %port.qualified_name,
            type_name = kind.type_name(),
            process = %process_guid,
            "port created"
        );
        Ok(guid)
    }

    pub async fn update_port_implementation(
        &self,
        user_id: &str,
        original: &EntityDetail,
        port_implementation: &PortImplementation,
        external_source_name: &str,
    ) -> Result<PortUpdate> {
        self.update_port(
            user_id,
            original,
            &port_implementation.port,
            PortKind::Implementation,
            external_source_name,
        )
        .await
    }

    pub async fn update_port_alias(
        &self,
        user_id: &str,
        original: &EntityDetail,
        port_alias: &PortAlias,
        external_source_name: &str,
    ) -> Result<PortUpdate> {
        self.update_port(
            user_id,
            original,
            &port_alias.port,
            PortKind::Alias,
            external_source_name,
        )
        .await
    }

    /// Bring the stored port `original` in line with `port`.
    ///
    /// When no property differs nothing is written and the external source is
    /// not resolved.
    pub async fn update_port(
        &self,
        user_id: &str,
        original: &EntityDetail,
        port: &Port,
        kind: PortKind,
        external_source_name: &str,
    ) -> Result<PortUpdate> {
        const ACTION: &str = "update_port";
        validate_port_parameters(user_id, port, ACTION)?;

        let candidate = port_properties(port);
        if !self.store.diff_properties(original, &candidate) {
            tracing::debug!(guid = %original.guid, qualified_name = %port.qualified_name, "port unchanged");
            return Ok(PortUpdate::Unchanged);
        }

        let source = self.external_source(user_id, external_source_name).await?;
        self.store
            .update_entity(user_id, &source, &original.guid, kind.type_name(), candidate)
            .await?;

        tracing::info!(guid = %original.guid, qualified_name = %port.qualified_name, "port updated");
        Ok(PortUpdate::Updated)
    }

    /// Link a port to its schema type, unless the link already exists.
    pub async fn add_port_schema_relationship(
        &self,
        user_id: &str,
        port_guid: &EntityGuid,
        schema_type_guid: &EntityGuid,
        external_source_name: &str,
    ) -> Result<()> {
        const ACTION: &str = "add_port_schema_relationship";
        validate_user_id(user_id, ACTION)?;

        let existing = self
            .store
            .relationship_exists(
                user_id,
                port_guid,
                schema_type_guid,
                PORT_TYPE_NAME,
                PORT_SCHEMA_RELATIONSHIP_TYPE_NAME,
            )
            .await?;
        if existing.is_some() {
            tracing::debug!(port = %port_guid, schema_type = %schema_type_guid, "port schema relationship already present");
            return Ok(());
        }

        let source = self.external_source(user_id, external_source_name).await?;
        self.store
            .create_relationship(
                user_id,
                &source,
                port_guid,
                schema_type_guid,
                PORT_SCHEMA_RELATIONSHIP_TYPE_NAME,
            )
            .await?;
        tracing::info!(port = %port_guid, schema_type = %schema_type_guid, "port schema relationship created");
        Ok(())
    }

    /// The schema type linked to a port. `Ok(None)` when the port has none.
    pub async fn find_schema_type_for_port(
        &self,
        user_id: &str,
        port_guid: &EntityGuid,
    ) -> Result<Option<EntityDetail>> {
        const ACTION: &str = "find_schema_type_for_port";
        validate_user_id(user_id, ACTION)?;

        let relationship_type = self
            .store
            .relationship_type(user_id, PORT_SCHEMA_RELATIONSHIP_TYPE_NAME)
            .await?;
        self.store
            .traverse_relationship(user_id, port_guid, PORT_TYPE_NAME, &relationship_type)
            .await
    }

    /// Delegate `port_guid` to the port named `delegates_to`.
    ///
    /// The stored type of the target must match `port_type`, ignoring case.
    pub async fn add_port_delegation_relationship(
        &self,
        user_id: &str,
        port_guid: &EntityGuid,
        port_type: PortType,
        delegates_to: &str,
        external_source_name: &str,
    ) -> Result<()> {
        const ACTION: &str = "add_port_delegation_relationship";
        validate_user_id(user_id, ACTION)?;
        validate_name(delegates_to, DELEGATES_TO_PARAMETER_NAME, ACTION)?;

        let target = self.delegation_target(user_id, port_type, delegates_to).await?;

        let existing = self
            .store
            .relationship_exists(
                user_id,
                port_guid,
                &target.guid,
                PORT_TYPE_NAME,
                PORT_DELEGATION_TYPE_NAME,
            )
            .await?;
        if existing.is_some() {
            tracing::debug!(port = %port_guid, delegates_to, "port delegation already present");
            return Ok(());
        }

        let source = self.external_source(user_id, external_source_name).await?;
        self.store
            .create_relationship(
                user_id,
                &source,
                port_guid,
                &target.guid,
                PORT_DELEGATION_TYPE_NAME,
            )
            .await?;
        tracing::info!(port = %port_guid, target = %target.guid, delegates_to, "port delegation created");
        Ok(())
    }

    /// The port named `delegates_to`, provided its stored type matches `port_type`.
    ///
    /// Lets callers check a delegation before creating the delegating port.
    pub async fn find_delegation_target(
        &self,
        user_id: &str,
        port_type: PortType,
        delegates_to: &str,
    ) -> Result<EntityDetail> {
        const ACTION: &str = "find_delegation_target";
        validate_user_id(user_id, ACTION)?;
        validate_name(delegates_to, DELEGATES_TO_PARAMETER_NAME, ACTION)?;
        self.delegation_target(user_id, port_type, delegates_to).await
    }

    async fn delegation_target(
        &self,
        user_id: &str,
        port_type: PortType,
        delegates_to: &str,
    ) -> Result<EntityDetail> {
        let Some(target) = self.find_port_entity(user_id, delegates_to).await? else {
            return Err(PortError::PortNotFound {
                qualified_name: delegates_to.to_string(),
            });
        };

        let actual = stored_port_type(&target);
        if !actual.is_some_and(|name| port_type.matches_name(name)) {
            return Err(PortError::InvalidPortType {
                qualified_name: delegates_to.to_string(),
                actual: actual.unwrap_or_default().to_string(),
            });
        }
        Ok(target)
    }

    /// Remove the port named `qualified_name`. Removing an absent port is a no-op.
    pub async fn remove_port(
        &self,
        user_id: &str,
        qualified_name: &str,
        external_source_name: &str,
    ) -> Result<()> {
        const ACTION: &str = "remove_port";
        validate_user_id(user_id, ACTION)?;
        validate_name(qualified_name, QUALIFIED_NAME_PARAMETER_NAME, ACTION)?;

        let Some(port) = self.find_port_entity(user_id, qualified_name).await? else {
            tracing::debug!(qualified_name, "port to remove not found");
            return Ok(());
        };

        let source = self.external_source(user_id, external_source_name).await?;
        self.store.delete_entity(user_id, &source, &port.guid).await?;
        tracing::info!(guid = %port.guid, qualified_name, "port removed");
        Ok(())
    }

    /// Find a port of either kind. Aliases are looked up first.
    pub async fn find_port_entity(
        &self,
        user_id: &str,
        qualified_name: &str,
    ) -> Result<Option<EntityDetail>> {
        if let Some(alias) = self.find_port_alias_entity(user_id, qualified_name).await? {
            return Ok(Some(alias));
        }
        self.find_port_implementation_entity(user_id, qualified_name)
            .await
    }

    pub async fn find_port_implementation_entity(
        &self,
        user_id: &str,
        qualified_name: &str,
    ) -> Result<Option<EntityDetail>> {
        self.find_entity(user_id, qualified_name, PORT_IMPLEMENTATION_TYPE_NAME)
            .await
    }

    pub async fn find_port_alias_entity(
        &self,
        user_id: &str,
        qualified_name: &str,
    ) -> Result<Option<EntityDetail>> {
        self.find_entity(user_id, qualified_name, PORT_ALIAS_TYPE_NAME)
            .await
    }

    async fn find_entity(
        &self,
        user_id: &str,
        qualified_name: &str,
        type_name: &str,
    ) -> Result<Option<EntityDetail>> {
        const ACTION: &str = "find_entity";
        validate_user_id(user_id, ACTION)?;
        validate_name(qualified_name, QUALIFIED_NAME_PARAMETER_NAME, ACTION)?;
        self.store
            .find_entity_by_qualified_name(user_id, qualified_name, type_name)
            .await
    }
}

fn validate_port_parameters(user_id: &str, port: &Port, action: &str) -> Result<()> {
    validate_user_id(user_id, action)?;
    validate_name(&port.display_name, DISPLAY_NAME_PARAMETER_NAME, action)?;
    validate_name(&port.qualified_name, QUALIFIED_NAME_PARAMETER_NAME, action)
}
