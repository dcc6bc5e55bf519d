//! portlink-core
//!
//! Port relationship management for a lineage metadata store.
//!
//! # Modules
//! - **domain**: identifiers, ports, stored records, type names, errors
//! - **ports**: seams to the metadata repository and the external-source registry
//! - **app**: the port manager and its wiring
//! - **impls**: in-memory and JSON-file stores, in-memory source registry
//! - **config**: TOML configuration

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;

pub use app::{ManagerBuilder, PortManager, PortUpdate};
pub use config::PortlinkConfig;
pub use domain::{PortError, Result};
