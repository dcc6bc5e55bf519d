//! IdGenerator port.
//!
//! Stores assign identifiers to new records through this trait.

use crate::domain::ids::{EntityGuid, ExternalSourceGuid, RelationshipGuid};
use crate::ports::Clock;
use ulid::Ulid;

/// Generates identifiers for stored records.
///
/// # Thread Safety
/// - `Send + Sync` so a single generator can serve concurrent callers
pub trait IdGenerator: Send + Sync {
    fn generate_entity_guid(&self) -> EntityGuid;

    fn generate_relationship_guid(&self) -> RelationshipGuid;

    fn generate_external_source_guid(&self) -> ExternalSourceGuid;
}

/// ULID-based generator whose timestamp part comes from a [`Clock`].
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    fn next_ulid(&self) -> Ulid {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        Ulid::from_parts(timestamp_ms, rand::random())
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_entity_guid(&self) -> EntityGuid {
        EntityGuid::from(self.next_ulid())
    }

    fn generate_relationship_guid(&self) -> RelationshipGuid {
        RelationshipGuid::from(self.next_ulid())
    }

    fn generate_external_source_guid(&self) -> ExternalSourceGuid {
        ExternalSourceGuid::from(self.next_ulid())
    }
}
