//! Containerized source builds.
//!
//! # Responsibilities
//! - Run a service's own `npm run build` inside the builder image, with the
//!   checkout bind-mounted and the build environment passed through
//! - Fall back to a plain tree copy for services without a build step
//!
//! # Design Decisions
//! - The project builds itself into `build/`; this tool only provides the
//!   container, mounts and environment
//! - SSH credentials are copied into the builder context, not bind-mounted,
//!   so concurrent builds cannot fight over ownership

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::process::{chown_to_invoker, docker};
use crate::scaffold::copy_tree;

/// Dockerfile for the builder image, relative to the working directory.
const BUILDER_DOCKERFILE: &str = "build-dockers/Dockerfile-build-alpine";
const BUILDER_TAG: &str = "portalctl-builder";

/// How a service's checkout is turned into a deployable `build/` tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildKind {
    /// Containerized `npm run build`.
    Container,
    /// Copy the checkout as-is.
    PlainCopy,
}

impl BuildKind {
    /// Map a recorded compile-script tag to a build kind. Unknown or missing
    /// tags fall back to the plain copy.
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag {
            Some("react" | "sails" | "node" | "nginx" | "frontend" | "backend") => Self::Container,
            _ => Self::PlainCopy,
        }
    }
}

/// Produce `{source}/build` from the checkout at `source`.
pub fn run_build(
    kind: BuildKind,
    source: &Path,
    environment: &BTreeMap<String, String>,
) -> Result<PathBuf> {
    match kind {
        BuildKind::Container => container_build(source, environment),
        BuildKind::PlainCopy => plain_copy(source),
    }
}

fn container_build(source: &Path, environment: &BTreeMap<String, String>) -> Result<PathBuf> {
    tracing::info!(source = %source.display(), "Javascript build started");
    let dest = source.join("build");
    if dest.exists() {
        fs::remove_dir_all(&dest)?;
    }
    fs::create_dir_all(&dest)?;
    let node_modules = source.join("node_modules");
    if node_modules.exists() {
        fs::remove_dir_all(&node_modules)?;
    }

    let result = (|| {
        copy_ssh_credentials()?;
        let image = docker::build(Path::new(BUILDER_DOCKERFILE), BUILDER_TAG)?;

        let home = std::env::var("HOME")
            .map_err(|_| Error::Format("HOME is not set".to_string()))?;
        let options = docker::RunOptions {
            volumes: vec![
                format!("{}:/javascript", source.display()),
                format!("{home}/.npm:/home/node/.npm"),
            ],
            environment: environment.clone(),
            temporary: true,
            ..docker::RunOptions::default()
        };
        let code = docker::run(&image, &options)?;
        if code != 0 {
            return Err(Error::CommandFailed {
                command: "build container".to_string(),
                status: code,
            });
        }
        Ok(())
    })();
    chown_to_invoker(source)?;
    result?;

    Ok(dest)
}

/// Copy SSH keys and known hosts into the builder context when absent, so the
/// builder image can reach private repositories.
fn copy_ssh_credentials() -> Result<()> {
    let home = match std::env::var("HOME") {
        Ok(home) => PathBuf::from(home),
        Err(_) => return Ok(()),
    };
    let ssh_dir = Path::new("build-dockers/local/ssh");
    fs::create_dir_all(ssh_dir)?;
    for name in ["id_rsa", "id_rsa.pub", "known_hosts"] {
        let target = ssh_dir.join(name);
        let origin = home.join(".ssh").join(name);
        if !target.is_file() && origin.is_file() {
            fs::copy(&origin, &target)?;
        }
    }
    Ok(())
}

fn plain_copy(source: &Path) -> Result<PathBuf> {
    tracing::info!(source = %source.display(), "No build step, copying checkout");
    let dest = source.join("build");
    if dest.exists() {
        fs::remove_dir_all(&dest)?;
    }
    copy_tree(source, &dest, &["build"])?;
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_kind_from_tag() {
        assert_eq!(BuildKind::from_tag(Some("react")), BuildKind::Container);
        assert_eq!(BuildKind::from_tag(Some("node")), BuildKind::Container);
        assert_eq!(BuildKind::from_tag(Some("nginx")), BuildKind::Container);
        assert_eq!(BuildKind::from_tag(Some("mystery")), BuildKind::PlainCopy);
        assert_eq!(BuildKind::from_tag(None), BuildKind::PlainCopy);
    }

    #[test]
    fn test_plain_copy_excludes_previous_build() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("checkout");
        fs::create_dir_all(source.join("build")).unwrap();
        fs::write(source.join("index.js"), "x").unwrap();
        fs::write(source.join("build/old"), "stale").unwrap();

        let dest = plain_copy(&source).unwrap();
        assert_eq!(dest, source.join("build"));
        assert!(dest.join("index.js").is_file());
        assert!(!dest.join("old").exists());
        assert!(!dest.join("build").exists());
    }
}
