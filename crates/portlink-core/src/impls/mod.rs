//! Impls - implementations of the ports.
//!
//! # Included
//! - **InMemoryEntityStore**: process-local store for development and tests
//! - **JsonFileEntityStore**: store persisted as a JSON snapshot file
//! - **InMemoryExternalSourceRegistry**: table of registered external sources
//!
//! Adapters to a remote metadata server implement the same traits in their
//! own crates.

mod store_state;

pub mod inmem_registry;
pub mod inmem_store;
pub mod json_store;

#[cfg(test)]
pub(crate) mod testing;

pub use self::inmem_registry::InMemoryExternalSourceRegistry;
pub use self::inmem_store::InMemoryEntityStore;
pub use self::json_store::JsonFileEntityStore;
pub use self::store_state::StoreSnapshot;
