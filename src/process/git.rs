//! Git invocation via a tooling container.
//!
//! # Design Decisions
//! - Git runs inside `bitnami/git` with the service directory bind-mounted at
//!   `/git` and the invoker's home at `/root` for credentials; the host needs
//!   no git installation
//! - Checkouts live under `{base}/{service}/javascript`
//! - Queries on a missing checkout return `None`, never an error

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::process::{chown_to_invoker, docker};
use crate::scaffold;

const GIT_IMAGE: &str = "bitnami/git";

/// Directory inside a service dir that holds the source checkout.
pub const CHECKOUT_DIR: &str = "javascript";

/// Path of a service's source checkout.
pub fn checkout_path(base_dir: &Path, fullname: &str) -> PathBuf {
    base_dir.join(fullname).join(CHECKOUT_DIR)
}

/// Run `git <args>` inside the tooling container with `mount_dir` at `/git`.
/// Returns the container exit code and captured stdout.
fn git_in_container(mount_dir: &Path, args: &[String], safe_fix: bool) -> Result<(i32, String)> {
    let git_line = format!("git {}", args.join(" "));
    let script = if safe_fix {
        format!("git config --global --add safe.directory /git && {git_line}")
    } else {
        git_line
    };
    let home = std::env::var("HOME").map_err(|_| Error::Format("HOME is not set".to_string()))?;

    let output_file = tempfile::NamedTempFile::new()?;
    let options = docker::RunOptions {
        volumes: vec![
            format!("{}:/git", mount_dir.display()),
            format!("{home}/:/root/"),
        ],
        workdir: Some("/git".to_string()),
        temporary: true,
        command: vec!["sh".to_string(), "-c".to_string(), script],
        ..docker::RunOptions::default()
    };
    let code = docker::run_captured(GIT_IMAGE, &options, output_file.path())?;
    let stdout = fs::read_to_string(output_file.path())?.trim().to_string();
    Ok((code, stdout))
}

fn ensure_depth(settings: &mut Vec<String>) {
    if !settings.iter().any(|s| s == "--depth") {
        settings.push("--depth".to_string());
        settings.push("1".to_string());
    }
}

/// Clone into `{base}/{fullname}/javascript`. Existing checkouts are guarded
/// by the overwrite rules; clones default to `--depth 1`.
pub fn clone_into(
    base_dir: &Path,
    fullname: &str,
    settings: &[String],
    overwrite: bool,
    no_overwrite: bool,
) -> Result<PathBuf> {
    let checkout = checkout_path(base_dir, fullname);
    if scaffold::clear_existing(&checkout, overwrite, no_overwrite)? {
        fs::remove_dir_all(&checkout)?;
    }

    let mut settings = settings.to_vec();
    ensure_depth(&mut settings);

    let service_dir = base_dir.join(fullname);
    fs::create_dir_all(&service_dir)?;
    tracing::info!(checkout = %checkout.display(), "Cloning source");

    let mut args = vec!["clone".to_string()];
    args.extend(settings);
    args.push(CHECKOUT_DIR.to_string());
    let result = git_in_container(&service_dir, &args, true);
    chown_to_invoker(base_dir)?;

    let (code, _) = result?;
    if code != 0 {
        return Err(Error::CommandFailed {
            command: "git clone".to_string(),
            status: code,
        });
    }
    Ok(checkout)
}

/// Refresh an existing checkout.
///
/// With a branch: re-clone that branch from the recorded remote, keeping a
/// backup of the old checkout and restoring it if the clone fails. Without a
/// branch: `git fetch origin`.
pub fn update(
    base_dir: &Path,
    fullname: &str,
    branch: Option<&str>,
    settings: &[String],
) -> Result<()> {
    match branch {
        Some(branch) => {
            let mut args = vec!["-b".to_string(), branch.to_string()];
            args.extend(settings.to_vec());
            clean_update(base_dir, fullname, &args)
        }
        None => {
            let checkout = checkout_path(base_dir, fullname);
            if !checkout.exists() {
                return Err(Error::MissingCheckout(checkout));
            }
            let mut args = vec!["fetch".to_string(), "origin".to_string()];
            let mut extra = settings.to_vec();
            ensure_depth(&mut extra);
            args.extend(extra);
            tracing::info!(checkout = %checkout.display(), "Fetching source");
            let result = git_in_container(&checkout, &args, false);
            chown_to_invoker(base_dir)?;
            let (code, _) = result?;
            if code != 0 {
                return Err(Error::CommandFailed {
                    command: "git fetch".to_string(),
                    status: code,
                });
            }
            Ok(())
        }
    }
}

/// Re-clone from the recorded remote URL, restoring the previous checkout on
/// failure.
fn clean_update(base_dir: &Path, fullname: &str, settings: &[String]) -> Result<()> {
    let checkout = checkout_path(base_dir, fullname);
    let backup = base_dir.join(fullname).join("javascript_backup");

    let url = remote_url(base_dir, fullname)?
        .ok_or_else(|| Error::MissingCheckout(checkout.clone()))?;

    let mut doing_backup = false;
    if checkout.exists() {
        if backup.exists() {
            fs::remove_dir_all(&backup)?;
        }
        fs::rename(&checkout, &backup)?;
        doing_backup = true;
    }

    let mut clone_settings = vec![url];
    clone_settings.extend(settings.to_vec());
    let result = clone_into(base_dir, fullname, &clone_settings, true, false);

    if result.is_err() && doing_backup && backup.exists() {
        tracing::warn!(checkout = %checkout.display(), "Clone failed, restoring backup");
        if checkout.exists() {
            fs::remove_dir_all(&checkout)?;
        }
        fs::rename(&backup, &checkout)?;
    }
    result.map(|_| ())
}

/// Branch the checkout is on, `None` when there is no usable checkout.
pub fn current_branch(base_dir: &Path, fullname: &str) -> Result<Option<String>> {
    query(base_dir, fullname, &["rev-parse", "--abbrev-ref", "HEAD"], false)
}

/// Remote origin URL, `None` when there is no usable checkout.
pub fn remote_url(base_dir: &Path, fullname: &str) -> Result<Option<String>> {
    query(base_dir, fullname, &["remote", "get-url", "origin"], true)
}

fn query(
    base_dir: &Path,
    fullname: &str,
    args: &[&str],
    safe_fix: bool,
) -> Result<Option<String>> {
    let checkout = checkout_path(base_dir, fullname);
    if !checkout.exists() {
        return Ok(None);
    }
    let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
    let (code, stdout) = git_in_container(&checkout, &args, safe_fix)?;
    if code != 0 || stdout.is_empty() {
        return Ok(None);
    }
    Ok(Some(stdout))
}
