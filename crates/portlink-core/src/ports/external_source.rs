//! ExternalSourceResolver port - maps an external system to its registered identifier.

use async_trait::async_trait;

use crate::domain::{ExternalSourceGuid, Result};

/// Resolves the qualified name of an external source (for example a data
/// processing engine) to its registered identifier.
///
/// Fails with `PropertyServer` when the source is unknown and with
/// `UserNotAuthorized` when the caller may not act on its behalf.
#[async_trait]
pub trait ExternalSourceResolver: Send + Sync {
    async fn resolve(&self, user_id: &str, qualified_name: &str) -> Result<ExternalSourceGuid>;
}
