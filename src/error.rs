//! Crate-wide error definitions.
//!
//! # Design Decisions
//! - One typed enum for every failure the CLI can surface; no stringly-typed
//!   error paths
//! - Removal of an already-absent route or service is an idempotent no-op,
//!   never an error
//! - External command failures carry the command line and exit status

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used by all fallible operations in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by routing, document and process operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A route path is already claimed by an existing entry.
    #[error("path {0} is already routed")]
    DuplicatePath(String),

    /// Malformed serialized route data or document field.
    #[error("format error: {0}")]
    Format(String),

    /// The proxy site template is missing.
    #[error("proxy template not found: {0}")]
    TemplateNotFound(PathBuf),

    /// A service name that is not present in the registry.
    #[error("unknown service: {0}")]
    UnknownBackend(String),

    /// A target location exists and overwriting was refused.
    #[error("{0} already exists")]
    AlreadyExists(PathBuf),

    /// A service has no git checkout where one was expected.
    #[error("no checkout at {0}")]
    MissingCheckout(PathBuf),

    /// An external command exited with a non-zero status.
    #[error("`{command}` exited with status {status}")]
    CommandFailed { command: String, status: i32 },

    /// Filesystem access failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The document could not be read or written as YAML.
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
