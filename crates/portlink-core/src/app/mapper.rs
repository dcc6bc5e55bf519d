//! Translation between ports and stored instance properties.
//!
//! The port type is carried in the domain as [`PortType`] only; here it is
//! written as an enum property holding both ordinal and symbolic name.

use crate::domain::types::{
    ADDITIONAL_PROPERTIES_PROPERTY_NAME, DISPLAY_NAME_PROPERTY_NAME, PORT_TYPE_PROPERTY_NAME,
    QUALIFIED_NAME_PROPERTY_NAME,
};
use crate::domain::{EntityDetail, InstanceProperties, Port, PortType, PropertyValue};

/// Properties of a port entity. Empty additional properties are omitted.
pub fn port_properties(port: &Port) -> InstanceProperties {
    let mut properties = InstanceProperties::new();
    properties.insert(
        QUALIFIED_NAME_PROPERTY_NAME.to_string(),
        PropertyValue::String(port.qualified_name.clone()),
    );
    properties.insert(
        DISPLAY_NAME_PROPERTY_NAME.to_string(),
        PropertyValue::String(port.display_name.clone()),
    );
    properties.insert(
        PORT_TYPE_PROPERTY_NAME.to_string(),
        PropertyValue::Enum {
            ordinal: port.port_type.ordinal(),
            symbolic_name: port.port_type.symbolic_name().to_string(),
        },
    );
    if !port.additional_properties.is_empty() {
        properties.insert(
            ADDITIONAL_PROPERTIES_PROPERTY_NAME.to_string(),
            PropertyValue::Map(port.additional_properties.clone()),
        );
    }
    properties
}

/// Symbolic name of the stored port type, as recorded in the store.
pub fn stored_port_type(entity: &EntityDetail) -> Option<&str> {
    entity.enum_symbolic_name(PORT_TYPE_PROPERTY_NAME)
}

/// Rebuild a port from a stored entity; `None` when required properties are missing.
pub fn port_from_entity(entity: &EntityDetail) -> Option<Port> {
    let port_type = stored_port_type(entity)?.parse::<PortType>().ok()?;
    Some(Port {
        qualified_name: entity.qualified_name()?.to_string(),
        display_name: entity
            .string_property(DISPLAY_NAME_PROPERTY_NAME)?
            .to_string(),
        port_type,
        additional_properties: entity
            .properties
            .get(ADDITIONAL_PROPERTIES_PROPERTY_NAME)
            .and_then(PropertyValue::as_map)
            .cloned()
            .unwrap_or_default(),
    })
}
