//! Errors raised by port management and its collaborators.

use thiserror::Error;

/// Operational classification of a [`PortError`].
///
/// - InvalidRequest: the caller must correct the input; never retried
/// - NotFound: a referenced port does not exist
/// - Unauthorized: the caller lacks permission
/// - Infrastructure: the backing store or registry failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidRequest,
    NotFound,
    Unauthorized,
    Infrastructure,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortError {
    /// A required parameter was missing, blank or malformed.
    #[error("invalid value for parameter '{parameter}' passed to {action}")]
    InvalidParameter { parameter: String, action: String },

    /// A delegation target does not resolve to any stored port.
    #[error("no port found with qualified name '{qualified_name}'")]
    PortNotFound { qualified_name: String },

    /// The stored type of a delegation target differs from the declared one.
    /// `actual` is empty when the stored entity carries no port type.
    #[error("port '{qualified_name}' has type '{actual}', which does not match the declared port type")]
    InvalidPortType {
        qualified_name: String,
        actual: String,
    },

    #[error("user '{user_id}' is not authorized to perform {action}")]
    UserNotAuthorized { user_id: String, action: String },

    /// Generic failure of the backing store or registry.
    #[error("metadata server failure: {0}")]
    PropertyServer(String),
}

impl PortError {
    pub fn invalid_parameter(parameter: impl Into<String>, action: impl Into<String>) -> Self {
        PortError::InvalidParameter {
            parameter: parameter.into(),
            action: action.into(),
        }
    }

    pub fn server(message: impl Into<String>) -> Self {
        PortError::PropertyServer(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PortError::InvalidParameter { .. } | PortError::InvalidPortType { .. } => {
                ErrorKind::InvalidRequest
            }
            PortError::PortNotFound { .. } => ErrorKind::NotFound,
            PortError::UserNotAuthorized { .. } => ErrorKind::Unauthorized,
            PortError::PropertyServer(_) => ErrorKind::Infrastructure,
        }
    }

    /// Stable code for diagnostics and log correlation.
    pub fn code(&self) -> &'static str {
        match self {
            PortError::InvalidParameter { .. } => "PORT-400-001",
            PortError::InvalidPortType { .. } => "PORT-400-002",
            PortError::UserNotAuthorized { .. } => "PORT-403-001",
            PortError::PortNotFound { .. } => "PORT-404-001",
            PortError::PropertyServer(_) => "PORT-500-001",
        }
    }
}

pub type Result<T> = std::result::Result<T, PortError>;
