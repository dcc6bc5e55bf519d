//! Batch requests applied through the port manager.
//!
//! Entities are referenced by qualified name; the runner resolves them to
//! GUIDs before each call.

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};

use portlink_core::domain::types::{
    PROCESS_TYPE_NAME, QUALIFIED_NAME_PROPERTY_NAME, SCHEMA_TYPE_TYPE_NAME,
};
use portlink_core::domain::{
    EntityDetail, ExternalSource, InstanceProperties, Port, PortAlias, PortError,
    PortImplementation, PortKind, PortType, PropertyValue,
};
use portlink_core::{PortManager, PortUpdate};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    CreateProcess {
        qualified_name: String,
    },
    CreateSchemaType {
        qualified_name: String,
    },
    CreatePort {
        kind: PortKind,
        process: String,
        port: Port,
        /// Alias only: port to delegate to right after creation.
        #[serde(default)]
        delegates_to: Option<String>,
    },
    UpdatePort {
        kind: PortKind,
        port: Port,
    },
    AddSchema {
        port: String,
        schema_type: String,
    },
    AddDelegation {
        port: String,
        port_type: PortType,
        delegates_to: String,
    },
    RemovePort {
        qualified_name: String,
    },
    FindPort {
        qualified_name: String,
    },
}

/// One printed result line.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Created {
        guid: String,
    },
    Updated,
    Unchanged,
    Linked,
    Removed,
    Found {
        port: Option<EntityDetail>,
        #[serde(skip_serializing_if = "Option::is_none")]
        schema_type: Option<EntityDetail>,
    },
    Failed {
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<&'static str>,
        message: String,
    },
}

impl Outcome {
    pub fn from_error(err: &anyhow::Error) -> Self {
        Outcome::Failed {
            code: err.downcast_ref::<PortError>().map(PortError::code),
            message: format!("{err:#}"),
        }
    }
}

pub fn parse_requests(raw: &str) -> anyhow::Result<Vec<Request>> {
    serde_json::from_str(raw).context("requests must be a JSON array of tagged requests")
}

/// Applies requests as one user on behalf of one external source.
pub struct RequestRunner {
    manager: PortManager,
    user_id: String,
    external_source: String,
}

impl RequestRunner {
    pub fn new(
        manager: PortManager,
        user_id: impl Into<String>,
        external_source: impl Into<String>,
    ) -> Self {
        Self {
            manager,
            user_id: user_id.into(),
            external_source: external_source.into(),
        }
    }

    pub fn manager(&self) -> &PortManager {
        &self.manager
    }

    pub async fn apply(&self, request: &Request) -> anyhow::Result<Outcome> {
        let user = self.user_id.as_str();
        let source = self.external_source.as_str();
        match request {
            Request::CreateProcess { qualified_name } => {
                self.create_plain_entity(PROCESS_TYPE_NAME, qualified_name)
                    .await
            }
            Request::CreateSchemaType { qualified_name } => {
                self.create_plain_entity(SCHEMA_TYPE_TYPE_NAME, qualified_name)
                    .await
            }
            Request::CreatePort {
                kind,
                process,
                port,
                delegates_to,
            } => {
                let process = self.require(PROCESS_TYPE_NAME, process).await?;
                let guid = match kind {
                    PortKind::Implementation => {
                        let implementation = PortImplementation::new(port.clone());
                        self.manager
                            .create_port_implementation(user, &implementation, &process.guid, source)
                            .await?
                    }
                    PortKind::Alias => {
                        let mut alias = PortAlias::new(port.clone());
                        if let Some(target) = delegates_to {
                            self.manager
                                .find_delegation_target(user, port.port_type, target)
                                .await?;
                            alias = alias.delegating_to(target);
                        }
                        let guid = self
                            .manager
                            .create_port_alias(user, &alias, &process.guid, source)
                            .await?;
                        if let Some(target) = &alias.delegates_to {
                            self.manager
                                .add_port_delegation_relationship(
                                    user,
                                    &guid,
                                    alias.port.port_type,
                                    target,
                                    source,
                                )
                                .await?;
                        }
                        guid
                    }
                };
                Ok(Outcome::Created {
                    guid: guid.to_string(),
                })
            }
            Request::UpdatePort { kind, port } => {
                let original = match kind {
                    PortKind::Implementation => {
                        self.manager
                            .find_port_implementation_entity(user, &port.qualified_name)
                            .await?
                    }
                    PortKind::Alias => {
                        self.manager
                            .find_port_alias_entity(user, &port.qualified_name)
                            .await?
                    }
                }
                .ok_or_else(|| PortError::PortNotFound {
                    qualified_name: port.qualified_name.clone(),
                })?;
                let update = self
                    .manager
                    .update_port(user, &original, port, *kind, source)
                    .await?;
                Ok(match update {
                    PortUpdate::Updated => Outcome::Updated,
                    PortUpdate::Unchanged => Outcome::Unchanged,
                })
            }
            Request::AddSchema { port, schema_type } => {
                let port = self.require_port(port).await?;
                let schema_type = self.require(SCHEMA_TYPE_TYPE_NAME, schema_type).await?;
                self.manager
                    .add_port_schema_relationship(user, &port.guid, &schema_type.guid, source)
                    .await?;
                Ok(Outcome::Linked)
            }
            Request::AddDelegation {
                port,
                port_type,
                delegates_to,
            } => {
                let port = self.require_port(port).await?;
                self.manager
                    .add_port_delegation_relationship(user, &port.guid, *port_type, delegates_to, source)
                    .await?;
                Ok(Outcome::Linked)
            }
            Request::RemovePort { qualified_name } => {
                self.manager
                    .remove_port(user, qualified_name, source)
                    .await?;
                Ok(Outcome::Removed)
            }
            Request::FindPort { qualified_name } => self.find(qualified_name).await,
        }
    }

    pub async fn find(&self, qualified_name: &str) -> anyhow::Result<Outcome> {
        let user = self.user_id.as_str();
        let port = self.manager.find_port_entity(user, qualified_name).await?;
        let schema_type = match &port {
            Some(port) => self.manager.find_schema_type_for_port(user, &port.guid).await?,
            None => None,
        };
        Ok(Outcome::Found { port, schema_type })
    }

    async fn create_plain_entity(
        &self,
        type_name: &str,
        qualified_name: &str,
    ) -> anyhow::Result<Outcome> {
        let user = self.user_id.as_str();
        let guid = self
            .manager
            .resolver()
            .resolve(user, &self.external_source)
            .await?;
        let source = ExternalSource {
            guid,
            qualified_name: self.external_source.clone(),
        };
        let mut properties = InstanceProperties::new();
        properties.insert(
            QUALIFIED_NAME_PROPERTY_NAME.to_string(),
            PropertyValue::String(qualified_name.to_string()),
        );
        let guid = self
            .manager
            .store()
            .create_entity(user, &source, type_name, properties, None)
            .await?;
        tracing::info!(%guid, type_name, qualified_name, "entity created");
        Ok(Outcome::Created {
            guid: guid.to_string(),
        })
    }

    async fn require(&self, type_name: &str, qualified_name: &str) -> anyhow::Result<EntityDetail> {
        self.manager
            .store()
            .find_entity_by_qualified_name(&self.user_id, qualified_name, type_name)
            .await?
            .ok_or_else(|| anyhow!("no {type_name} named {qualified_name}"))
    }

    async fn require_port(&self, qualified_name: &str) -> anyhow::Result<EntityDetail> {
        self.manager
            .find_port_entity(&self.user_id, qualified_name)
            .await?
            .ok_or_else(|| {
                PortError::PortNotFound {
                    qualified_name: qualified_name.to_string(),
                }
                .into()
            })
    }
}
