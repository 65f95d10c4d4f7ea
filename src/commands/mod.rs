//! Command handlers behind the CLI.
//!
//! # Data Flow
//! ```text
//! main.rs (argument parsing)
//!     → load document → ServiceRegistry
//!     → one handler below (mutates the registry, runs git/docker/scaffold)
//!     → save document (only after the handler succeeded)
//!     → docker-compose up for the affected services
//! ```
//!
//! # Design Decisions
//! - Handlers mutate the in-memory registry before touching the filesystem
//!   or docker, so a routing failure aborts with nothing persisted
//! - Handlers return the service names whose containers must be rebuilt; an
//!   empty list means "all of them"

pub mod add;
pub mod create;
pub mod list;
pub mod purge;
pub mod rebuild;
pub mod reload;
pub mod remove;
pub mod update;

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Options shared by every command.
#[derive(Debug, Clone)]
pub struct GlobalOpts {
    /// The group directory holding the document and service directories.
    pub directory: PathBuf,
    /// Full name of the reverse proxy service.
    pub proxy_name: String,
    /// Less user interaction.
    pub quiet: bool,
    /// Clear existing target directories without asking.
    pub overwrite: bool,
    /// Fail instead of asking when a target directory exists.
    pub no_overwrite: bool,
}

impl GlobalOpts {
    /// Quiet mode cannot prompt, so it implies no-overwrite.
    pub fn effective_no_overwrite(&self) -> bool {
        self.no_overwrite || self.quiet
    }
}

/// The group name is the last component of the group directory.
pub fn group_name(directory: &Path) -> Result<String> {
    directory
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            Error::Format(format!(
                "cannot derive a group name from {}",
                directory.display()
            ))
        })
}

/// Split a `KEY=VALUE` argument.
pub(crate) fn split_env_entry(entry: &str) -> Result<(&str, &str)> {
    entry
        .split_once('=')
        .ok_or_else(|| Error::Format(format!("environment entry {entry:?} is not KEY=VALUE")))
}

/// Load an optional YAML settings overlay from disk.
pub fn load_overlay(path: Option<&Path>) -> Result<Option<serde_yaml::Value>> {
    match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            Ok(Some(serde_yaml::from_str(&content)?))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_name_is_last_component() {
        assert_eq!(group_name(Path::new("/srv/groups/acme")).unwrap(), "acme");
        assert!(group_name(Path::new("/")).is_err());
    }

    #[test]
    fn test_split_env_entry() {
        assert_eq!(split_env_entry("A=b=c").unwrap(), ("A", "b=c"));
        assert!(split_env_entry("broken").is_err());
    }
}
