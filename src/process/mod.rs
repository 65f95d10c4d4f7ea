//! External process invocation.
//!
//! # Design Decisions
//! - Synchronous, blocking calls with no internal timeout; the external
//!   tool's own discipline applies and cancellation is not supported
//! - Docker is always invoked through sudo, matching how the managed hosts
//!   are provisioned
//! - Git never runs on the host: it runs inside a tooling container with the
//!   checkout bind-mounted, so the host needs no git installation

pub mod docker;
pub mod git;

use std::path::Path;
use std::process::Command;

use crate::error::{Error, Result};

/// Run a prepared command, mapping a non-zero exit to a typed error.
pub(crate) fn run_checked(mut cmd: Command, description: &str) -> Result<()> {
    let status = cmd.status()?;
    if !status.success() {
        return Err(Error::CommandFailed {
            command: description.to_string(),
            status: status.code().unwrap_or(-1),
        });
    }
    Ok(())
}

/// Run a prepared command and capture trimmed stdout; non-zero exit is a
/// typed error.
pub(crate) fn capture(mut cmd: Command, description: &str) -> Result<String> {
    let output = cmd.output()?;
    if !output.status.success() {
        return Err(Error::CommandFailed {
            command: description.to_string(),
            status: output.status.code().unwrap_or(-1),
        });
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout.trim().trim_matches('\'').to_string())
}

/// Hand ownership of container-written files back to the invoking user.
pub fn chown_to_invoker(path: &Path) -> Result<()> {
    let user = std::env::var("USER").unwrap_or_else(|_| "root".to_string());
    let mut id = Command::new("id");
    id.arg("-g");
    let group = capture(id, "id -g")?;

    let mut cmd = Command::new("sudo");
    cmd.args(["chown", "-R"])
        .arg(format!("{user}:{group}"))
        .arg(path);
    run_checked(cmd, "sudo chown")
}
