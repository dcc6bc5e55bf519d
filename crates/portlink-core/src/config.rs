//! Configuration loaded from TOML.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortlinkConfig {
    /// Calling user for operations that do not name one.
    pub user_id: String,

    /// Log filter applied when `RUST_LOG` is unset (e.g. "info", "portlink_core=debug").
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub external_sources: Vec<ExternalSourceConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lineage: Option<LineageServiceConfig>,
}

fn default_log_filter() -> String {
    "info".to_string()
}

/// Entity store backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreConfig {
    #[default]
    Memory,
    JsonFile {
        path: PathBuf,
    },
}

/// An external source registered at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalSourceConfig {
    pub qualified_name: String,
    /// Absent: every user may act on behalf of the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorized_users: Option<Vec<String>>,
}

/// Settings of the lineage server this store feeds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineageServiceConfig {
    pub open_lineage_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_lineage_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_lineage_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lineage_server_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lineage_server_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_topic_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_topic: Option<ConnectionConfig>,
}

/// Connection to the inbound topic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connector_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub configuration_properties: BTreeMap<String, String>,
}

impl PortlinkConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&raw)?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.user_id.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "user_id",
                reason: "must not be empty".to_string(),
            });
        }
        if let StoreConfig::JsonFile { path } = &self.store
            && path.as_os_str().is_empty()
        {
            return Err(ConfigError::Invalid {
                field: "store.path",
                reason: "must not be empty".to_string(),
            });
        }
        if let Some(source) = self
            .external_sources
            .iter()
            .find(|source| source.qualified_name.trim().is_empty())
        {
            return Err(ConfigError::Invalid {
                field: "external_sources.qualified_name",
                reason: format!("blank name in {source:?}"),
            });
        }
        if let Some(lineage) = &self.lineage
            && lineage
                .lineage_server_url
                .as_deref()
                .is_some_and(|url| url.trim().is_empty())
        {
            return Err(ConfigError::Invalid {
                field: "lineage.lineage_server_url",
                reason: "must not be blank when set".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const FULL: &str = r#"
user_id = "steward"
log_filter = "portlink_core=debug"

[store]
kind = "json_file"
path = "/var/lib/portlink/store.json"

[[external_sources]]
qualified_name = "engine"
authorized_users = ["steward"]

[[external_sources]]
qualified_name = "open"

[lineage]
open_lineage_id = 7
open_lineage_name = "lineage"
lineage_server_url = "http://localhost:9443"
in_topic_name = "in"
unknown_key = "ignored"

[lineage.in_topic]
connector_type = "kafka"
endpoint = "localhost:9092"

[lineage.in_topic.configuration_properties]
"group.id" = "portlink"
"#;

    #[test]
    fn full_config_parses() {
        let config = PortlinkConfig::from_toml_str(FULL).unwrap();

        assert_eq!(config.user_id, "steward");
        assert_eq!(config.log_filter, "portlink_core=debug");
        assert_eq!(
            config.store,
            StoreConfig::JsonFile {
                path: PathBuf::from("/var/lib/portlink/store.json")
            }
        );
        assert_eq!(config.external_sources.len(), 2);
        assert_eq!(config.external_sources[1].authorized_users, None);

        let lineage = config.lineage.unwrap();
        assert_eq!(lineage.open_lineage_id, 7);
        assert_eq!(lineage.lineage_server_type, None);
        let topic = lineage.in_topic.unwrap();
        assert_eq!(topic.connector_type.as_deref(), Some("kafka"));
        assert_eq!(
            topic.configuration_properties.get("group.id").map(String::as_str),
            Some("portlink")
        );
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config = PortlinkConfig::from_toml_str(r#"user_id = "u""#).unwrap();
        assert_eq!(config.store, StoreConfig::Memory);
        assert_eq!(config.log_filter, "info");
        assert!(config.external_sources.is_empty());
        assert!(config.lineage.is_none());
    }

    #[test]
    fn lineage_defaults_and_equality() {
        let a = LineageServiceConfig::default();
        assert_eq!(a.open_lineage_id, 0);
        let mut b = a.clone();
        assert_eq!(a, b);
        b.in_topic_name = Some("in".to_string());
        assert_ne!(a, b);
    }

    #[test]
    fn absent_fields_are_omitted_when_serialized() {
        let lineage = LineageServiceConfig {
            open_lineage_name: Some("lineage".to_string()),
            ..Default::default()
        };
        let rendered = toml::to_string(&lineage).unwrap();
        assert!(rendered.contains("open_lineage_name"));
        assert!(!rendered.contains("lineage_server_url"));
        assert!(!rendered.contains("in_topic"));
    }

    #[rstest]
    #[case::blank_user(r#"user_id = " ""#, "user_id")]
    #[case::empty_store_path(
        "user_id = \"u\"\n[store]\nkind = \"json_file\"\npath = \"\"",
        "store.path"
    )]
    #[case::blank_source(
        "user_id = \"u\"\n[[external_sources]]\nqualified_name = \"\"",
        "external_sources.qualified_name"
    )]
    #[case::blank_lineage_url(
        "user_id = \"u\"\n[lineage]\nlineage_server_url = \"  \"",
        "lineage.lineage_server_url"
    )]
    fn invalid_values_are_rejected(#[case] raw: &str, #[case] expected: &str) {
        let err = PortlinkConfig::from_toml_str(raw).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field, .. } if field == expected));
    }

    #[test]
    fn missing_user_is_a_parse_error() {
        let err = PortlinkConfig::from_toml_str("log_filter = \"info\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = PortlinkConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
