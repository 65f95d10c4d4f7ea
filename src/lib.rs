//! Container fleet management behind an nginx reverse proxy.

// Core subsystems
pub mod document;
pub mod routing;
pub mod services;

// Proxy configuration
pub mod nginx;

// Glue around the core
pub mod build;
pub mod commands;
pub mod process;
pub mod scaffold;

// Cross-cutting concerns
pub mod error;

pub use document::ComposeFile;
pub use error::{Error, Result};
pub use routing::{RouteEntry, RoutingTable};
pub use services::ServiceRegistry;
