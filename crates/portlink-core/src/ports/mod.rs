//! Ports - seams to the collaborators of the port manager.
//!
//! Each trait hides an external system (metadata repository, external-source
//! registry) or an ambient concern (time, identifiers) behind an interface.

pub mod clock;
pub mod entity_store;
pub mod external_source;
pub mod id_generator;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::entity_store::EntityStore;
pub use self::external_source::ExternalSourceResolver;
pub use self::id_generator::{IdGenerator, UlidGenerator};
