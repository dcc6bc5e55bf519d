//! App - application layer.
//!
//! Combines the ports into the port relationship rules.
//!
//! # Components
//! - **PortManager**: port creation, update, linking and removal
//! - **ManagerBuilder**: wiring from explicit collaborators or a config file
//! - **mapper**: ports to stored instance properties and back
//! - **validation**: parameter checks shared by the operations

pub mod builder;
pub mod mapper;
pub mod port_manager;
pub mod validation;

pub use self::builder::{BuildError, ManagerBuilder};
pub use self::port_manager::{PortManager, PortUpdate};
