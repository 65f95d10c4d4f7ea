//! Docker process invocation.
//!
//! # Responsibilities
//! - Inspect containers and networks
//! - Build images, run one-shot containers, remove networks
//! - Bring the group up via `docker-compose up`

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;

use crate::error::{Error, Result};
use crate::process::{capture, run_checked};

fn docker() -> Command {
    let mut cmd = Command::new("sudo");
    cmd.arg("docker");
    cmd
}

/// `docker inspect` with an optional Go template.
pub fn inspect(ident: &str, go_template: Option<&str>) -> Result<String> {
    let mut cmd = docker();
    cmd.args(["inspect", ident]);
    if let Some(template) = go_template {
        cmd.arg(format!("--format='{template}'"));
    }
    capture(cmd, "docker inspect")
}

/// `docker network inspect` with an optional Go template.
pub fn network_inspect(ident: &str, go_template: Option<&str>) -> Result<String> {
    let mut cmd = docker();
    cmd.args(["network", "inspect", ident]);
    if let Some(template) = go_template {
        cmd.arg(format!("--format='{template}'"));
    }
    capture(cmd, "docker network inspect")
}

/// Current container state (`running`, `exited`, …).
pub fn status(ident: &str) -> Result<String> {
    inspect(ident, Some("{{.State.Status}}"))
}

/// Names of containers attached to a network.
pub fn network_containers(network: &str) -> Result<Vec<String>> {
    let json = network_inspect(network, Some("{{json .Containers}}"))?;
    let value: serde_json::Value = serde_json::from_str(&json)
        .map_err(|e| Error::Format(format!("docker network inspect output: {e}")))?;
    let map = value
        .as_object()
        .ok_or_else(|| Error::Format("docker network inspect output is not a map".to_string()))?;
    Ok(map.keys().cloned().collect())
}

/// `docker network rm` for every given network.
pub fn remove_networks(idents: &[String]) -> Result<()> {
    if idents.is_empty() {
        return Ok(());
    }
    let mut cmd = docker();
    cmd.args(["network", "rm"]).args(idents);
    run_checked(cmd, "docker network rm")
}

/// `docker rm [-f]`.
pub fn remove_container(ident: &str, forced: bool) -> Result<()> {
    let mut cmd = docker();
    cmd.arg("rm");
    if forced {
        cmd.arg("-f");
    }
    cmd.arg(ident);
    run_checked(cmd, "docker rm")
}

/// `docker build -q -t <tag>`; returns the built image id.
pub fn build(dockerfile: &Path, tag: &str) -> Result<String> {
    let (directory, file_arg) = if dockerfile.is_file() {
        (
            dockerfile.parent().unwrap_or(Path::new(".")).to_path_buf(),
            Some(dockerfile.to_path_buf()),
        )
    } else {
        (dockerfile.to_path_buf(), None)
    };

    let mut cmd = docker();
    cmd.arg("build").arg(&directory).args(["-t", tag, "-q"]);
    if let Some(file) = file_arg {
        cmd.arg(format!("--file={}", file.display()));
    }
    capture(cmd, "docker build")
}

/// Options for a one-shot `docker run`.
#[derive(Debug, Default)]
pub struct RunOptions {
    /// Bind mounts, `host:container`.
    pub volumes: Vec<String>,
    /// Environment passed with `-e`.
    pub environment: BTreeMap<String, String>,
    /// Working directory inside the container.
    pub workdir: Option<String>,
    /// Remove the container when it exits (`--rm`).
    pub temporary: bool,
    /// Command and arguments to run inside the container.
    pub command: Vec<String>,
}

fn run_command(image: &str, options: &RunOptions) -> Command {
    let mut cmd = docker();
    cmd.arg("run");
    if options.temporary {
        cmd.arg("--rm");
    }
    if let Some(workdir) = &options.workdir {
        cmd.arg(format!("--workdir={workdir}"));
    }
    for volume in &options.volumes {
        cmd.arg(format!("--volume={volume}"));
    }
    for (var, value) in &options.environment {
        cmd.args(["-e", &format!("{var}={value}")]);
    }
    cmd.arg(image);
    cmd.args(&options.command);
    cmd
}

/// Run a container attached and return its exit status code. A non-zero
/// container exit is reported in the return value, not as an error; spawn
/// failures are errors.
pub fn run(image: &str, options: &RunOptions) -> Result<i32> {
    tracing::debug!(image, command = ?options.command, "Running container");
    let status = run_command(image, options).status()?;
    Ok(status.code().unwrap_or(-1))
}

/// Like [`run`] but with the container's stdout redirected to a file.
pub fn run_captured(image: &str, options: &RunOptions, stdout_path: &Path) -> Result<i32> {
    tracing::debug!(image, command = ?options.command, "Running container");
    let out = std::fs::File::create(stdout_path)?;
    let status = run_command(image, options).stdout(out).status()?;
    Ok(status.code().unwrap_or(-1))
}

/// `docker-compose up --build -d --remove-orphans [services…]` in `directory`.
pub fn compose_up(services: &[String], directory: &Path) -> Result<()> {
    let mut cmd = Command::new("sudo");
    cmd.args(["docker-compose", "up", "--build", "-d", "--remove-orphans"])
        .args(services)
        .current_dir(directory);
    tracing::info!(?services, "docker-compose up");
    run_checked(cmd, "docker-compose up")
}
