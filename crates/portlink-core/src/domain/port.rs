//! Port model: process input/output endpoints in the lineage graph.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::types::{PORT_ALIAS_TYPE_NAME, PORT_IMPLEMENTATION_TYPE_NAME};

/// Direction of a port.
///
/// The variant order defines the ordinal stored alongside the symbolic name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PortType {
    InoutPort,
    InputPort,
    OutputPort,
    OutinPort,
}

impl PortType {
    pub const ALL: [PortType; 4] = [
        PortType::InoutPort,
        PortType::InputPort,
        PortType::OutputPort,
        PortType::OutinPort,
    ];

    pub fn ordinal(self) -> u32 {
        match self {
            PortType::InoutPort => 0,
            PortType::InputPort => 1,
            PortType::OutputPort => 2,
            PortType::OutinPort => 3,
        }
    }

    pub fn symbolic_name(self) -> &'static str {
        match self {
            PortType::InoutPort => "INOUT_PORT",
            PortType::InputPort => "INPUT_PORT",
            PortType::OutputPort => "OUTPUT_PORT",
            PortType::OutinPort => "OUTIN_PORT",
        }
    }

    /// True when `name` denotes this port type, ignoring ASCII case.
    pub fn matches_name(self, name: &str) -> bool {
        self.symbolic_name().eq_ignore_ascii_case(name)
    }
}

impl fmt::Display for PortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbolic_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown port type '{0}'")]
pub struct UnknownPortType(pub String);

impl FromStr for PortType {
    type Err = UnknownPortType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PortType::ALL
            .into_iter()
            .find(|port_type| port_type.matches_name(s.trim()))
            .ok_or_else(|| UnknownPortType(s.to_string()))
    }
}

/// Properties shared by every port variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub qualified_name: String,
    pub display_name: String,
    pub port_type: PortType,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub additional_properties: BTreeMap<String, String>,
}

impl Port {
    pub fn new(
        qualified_name: impl Into<String>,
        display_name: impl Into<String>,
        port_type: PortType,
    ) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            display_name: display_name.into(),
            port_type,
            additional_properties: BTreeMap::new(),
        }
    }

    pub fn with_additional_property(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.additional_properties.insert(key.into(), value.into());
        self
    }
}

/// A port owned directly by a process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortImplementation {
    #[serde(flatten)]
    pub port: Port,
}

impl PortImplementation {
    pub fn new(port: Port) -> Self {
        Self { port }
    }
}

/// A port that forwards to another port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortAlias {
    #[serde(flatten)]
    pub port: Port,
    /// Qualified name of the port this alias delegates to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delegates_to: Option<String>,
}

impl PortAlias {
    pub fn new(port: Port) -> Self {
        Self {
            port,
            delegates_to: None,
        }
    }

    pub fn delegating_to(mut self, qualified_name: impl Into<String>) -> Self {
        self.delegates_to = Some(qualified_name.into());
        self
    }
}

/// Which concrete port variant an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortKind {
    Implementation,
    Alias,
}

impl PortKind {
    pub fn type_name(self) -> &'static str {
        match self {
            PortKind::Implementation => PORT_IMPLEMENTATION_TYPE_NAME,
            PortKind::Alias => PORT_ALIAS_TYPE_NAME,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn port_type_serializes_as_symbolic_name() {
        for port_type in PortType::ALL {
            let s = serde_json::to_string(&port_type).unwrap();
            assert_eq!(s, format!("\"{}\"", port_type.symbolic_name()));
        }
    }

    #[test]
    fn ordinals_follow_declaration_order() {
        let ordinals: Vec<u32> = PortType::ALL.into_iter().map(PortType::ordinal).collect();
        assert_eq!(ordinals, vec![0, 1, 2, 3]);
    }

    #[rstest]
    #[case::exact("INPUT_PORT", PortType::InputPort)]
    #[case::lower("input_port", PortType::InputPort)]
    #[case::mixed("OutIn_Port", PortType::OutinPort)]
    #[case::padded(" INOUT_PORT ", PortType::InoutPort)]
    fn parse_ignores_case(#[case] raw: &str, #[case] expected: PortType) {
        assert_eq!(raw.parse::<PortType>().unwrap(), expected);
    }

    #[test]
    fn parse_rejects_unknown_names() {
        assert_eq!(
            "SIDE_PORT".parse::<PortType>(),
            Err(UnknownPortType("SIDE_PORT".to_string()))
        );
    }

    #[test]
    fn alias_flattens_port_fields() {
        let alias = PortAlias::new(Port::new("alias", "Alias", PortType::OutputPort))
            .delegating_to("target");
        let v = serde_json::to_value(&alias).unwrap();
        assert_eq!(v["qualified_name"], "alias");
        assert_eq!(v["port_type"], "OUTPUT_PORT");
        assert_eq!(v["delegates_to"], "target");
        assert!(v.get("additional_properties").is_none());
    }

    #[test]
    fn kind_maps_to_entity_type() {
        assert_eq!(PortKind::Implementation.type_name(), "PortImplementation");
        assert_eq!(PortKind::Alias.type_name(), "PortAlias");
    }
}
