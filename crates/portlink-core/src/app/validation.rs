//! Parameter validation run before any collaborator call.

use crate::domain::{EntityGuid, PortError, Result};

pub const USER_ID_PARAMETER_NAME: &str = "userId";

pub fn validate_user_id(user_id: &str, action: &str) -> Result<()> {
    validate_name(user_id, USER_ID_PARAMETER_NAME, action)
}

/// Rejects empty and whitespace-only values.
pub fn validate_name(value: &str, parameter: &str, action: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(PortError::invalid_parameter(parameter, action));
    }
    Ok(())
}

/// Parses a caller-supplied entity identifier.
pub fn validate_guid(raw: &str, parameter: &str, action: &str) -> Result<EntityGuid> {
    validate_name(raw, parameter, action)?;
    raw.parse::<EntityGuid>()
        .map_err(|_| PortError::invalid_parameter(parameter, action))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use ulid::Ulid;

    #[rstest]
    #[case::empty("")]
    #[case::spaces("   ")]
    #[case::tab("\t")]
    fn blank_names_are_rejected(#[case] value: &str) {
        let err = validate_name(value, "qualifiedName", "create_port").unwrap_err();
        assert_eq!(err, PortError::invalid_parameter("qualifiedName", "create_port"));
    }

    #[test]
    fn blank_user_id_names_the_parameter() {
        let err = validate_user_id("", "remove_port").unwrap_err();
        assert_eq!(err, PortError::invalid_parameter(USER_ID_PARAMETER_NAME, "remove_port"));
    }

    #[test]
    fn guid_must_be_well_formed() {
        let guid = EntityGuid::from_ulid(Ulid::new());
        assert_eq!(validate_guid(&guid.to_string(), "processGUID", "create_port").unwrap(), guid);

        assert!(matches!(
            validate_guid("process-1", "processGUID", "create_port"),
            Err(PortError::InvalidParameter { .. })
        ));
        assert!(matches!(
            validate_guid("", "processGUID", "create_port"),
            Err(PortError::InvalidParameter { .. })
        ));
    }
}
