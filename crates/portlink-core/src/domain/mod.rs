//! Domain model: identifiers, ports, stored records, type names and errors.

pub mod entity;
pub mod errors;
pub mod ids;
pub mod port;
pub mod types;

pub use entity::{
    EntityDetail, ExternalSource, InstanceProperties, Ownership, PropertyValue, Relationship,
    RelationshipTypeDef,
};
pub use errors::{ErrorKind, PortError, Result};
pub use ids::{EntityGuid, ExternalSourceGuid, Id, IdMarker, RelationshipGuid};
pub use port::{Port, PortAlias, PortImplementation, PortKind, PortType, UnknownPortType};
