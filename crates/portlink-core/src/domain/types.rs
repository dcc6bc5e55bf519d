//! Type and property names understood by the metadata store.

use super::entity::RelationshipTypeDef;

pub const PORT_TYPE_NAME: &str = "Port";
pub const PORT_IMPLEMENTATION_TYPE_NAME: &str = "PortImplementation";
pub const PORT_ALIAS_TYPE_NAME: &str = "PortAlias";
pub const PROCESS_TYPE_NAME: &str = "Process";
pub const SCHEMA_TYPE_TYPE_NAME: &str = "SchemaType";

pub const PROCESS_PORT_TYPE_NAME: &str = "ProcessPort";
pub const PORT_SCHEMA_RELATIONSHIP_TYPE_NAME: &str = "PortSchema";
pub const PORT_DELEGATION_TYPE_NAME: &str = "PortDelegation";

pub const QUALIFIED_NAME_PROPERTY_NAME: &str = "qualifiedName";
pub const DISPLAY_NAME_PROPERTY_NAME: &str = "displayName";
pub const PORT_TYPE_PROPERTY_NAME: &str = "portType";
pub const ADDITIONAL_PROPERTIES_PROPERTY_NAME: &str = "additionalProperties";

/// Direct super type of an entity type, if any.
pub fn super_type(type_name: &str) -> Option<&'static str> {
    match type_name {
        PORT_IMPLEMENTATION_TYPE_NAME | PORT_ALIAS_TYPE_NAME => Some(PORT_TYPE_NAME),
        _ => None,
    }
}

/// True when `type_name` is `expected` or one of its subtypes.
pub fn is_type_of(type_name: &str, expected: &str) -> bool {
    let mut current = Some(type_name);
    while let Some(name) = current {
        if name == expected {
            return true;
        }
        current = super_type(name);
    }
    false
}

const RELATIONSHIP_TYPES: [RelationshipTypeDef; 3] = [
    RelationshipTypeDef {
        name: PROCESS_PORT_TYPE_NAME,
        end1_type: PROCESS_TYPE_NAME,
        end2_type: PORT_TYPE_NAME,
    },
    RelationshipTypeDef {
        name: PORT_SCHEMA_RELATIONSHIP_TYPE_NAME,
        end1_type: PORT_TYPE_NAME,
        end2_type: SCHEMA_TYPE_TYPE_NAME,
    },
    RelationshipTypeDef {
        name: PORT_DELEGATION_TYPE_NAME,
        end1_type: PORT_TYPE_NAME,
        end2_type: PORT_TYPE_NAME,
    },
];

/// Relationship type definitions known to the store.
pub fn relationship_type_def(name: &str) -> Option<RelationshipTypeDef> {
    RELATIONSHIP_TYPES.iter().find(|def| def.name == name).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::implementation(PORT_IMPLEMENTATION_TYPE_NAME, PORT_TYPE_NAME, true)]
    #[case::alias(PORT_ALIAS_TYPE_NAME, PORT_TYPE_NAME, true)]
    #[case::itself(PORT_TYPE_NAME, PORT_TYPE_NAME, true)]
    #[case::process(PROCESS_TYPE_NAME, PORT_TYPE_NAME, false)]
    #[case::reversed(PORT_TYPE_NAME, PORT_ALIAS_TYPE_NAME, false)]
    fn type_hierarchy(#[case] type_name: &str, #[case] expected: &str, #[case] result: bool) {
        assert_eq!(is_type_of(type_name, expected), result);
    }

    #[test]
    fn known_relationship_types_resolve() {
        let def = relationship_type_def(PORT_SCHEMA_RELATIONSHIP_TYPE_NAME).unwrap();
        assert_eq!(def.name, PORT_SCHEMA_RELATIONSHIP_TYPE_NAME);
        assert_eq!(def.end1_type, PORT_TYPE_NAME);
        assert_eq!(def.end2_type, SCHEMA_TYPE_TYPE_NAME);

        assert!(relationship_type_def("DataFlow").is_none());
    }
}
