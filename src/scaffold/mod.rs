//! Dockerfile and template scaffolding for new services.
//!
//! # Responsibilities
//! - Materialize a service directory from the bundled templates
//! - Rewrite the node base image to the requested version
//! - Guard existing targets behind overwrite/no-overwrite/interactive rules

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

/// Template sources, relative to the tool's working directory.
pub const NODE_TEMPLATE: &str = "node-template/Dockerfile-nodejs";
pub const NGINX_TEMPLATE_DIR: &str = "nginx-template";
pub const REDIS_TEMPLATE_DIR: &str = "redis-template";

static FROM_NODE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*FROM\s+node:").expect("invalid pattern"));

/// Decide what to do with an existing target location.
///
/// Returns `Ok(true)` when the target exists and the caller should clear it,
/// `Ok(false)` when there is nothing in the way. With neither flag set the
/// user is asked; declining fails with [`Error::AlreadyExists`].
pub fn clear_existing(location: &Path, overwrite: bool, no_overwrite: bool) -> Result<bool> {
    if !location.exists() {
        return Ok(false);
    }
    if overwrite {
        return Ok(true);
    }
    if no_overwrite {
        return Err(Error::AlreadyExists(location.to_path_buf()));
    }
    println!("{} already existing.", location.display());
    print!("Clear build directory? [y, N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    if matches!(answer.trim(), "y" | "Y") {
        Ok(true)
    } else {
        Err(Error::AlreadyExists(location.to_path_buf()))
    }
}

/// Write `{base}/{name}/Dockerfile` from the node template, pinning the
/// requested node version on an alpine base.
pub fn node_dockerfile(
    base_dir: &Path,
    name: &str,
    node_version: &str,
    overwrite: bool,
    no_overwrite: bool,
) -> Result<PathBuf> {
    let service_dir = base_dir.join(name);
    let dockerfile = service_dir.join("Dockerfile");
    if clear_existing(&dockerfile, overwrite, no_overwrite)? {
        fs::remove_file(&dockerfile)?;
    }
    fs::create_dir_all(&service_dir)?;

    let template = fs::read_to_string(NODE_TEMPLATE)?;
    let converted: String = template
        .split_inclusive('\n')
        .map(|line| convert_dockerfile_line(line, node_version))
        .collect();
    fs::write(&dockerfile, converted)?;
    Ok(service_dir)
}

fn convert_dockerfile_line(line: &str, node_version: &str) -> String {
    if FROM_NODE_LINE.is_match(line) {
        format!("FROM node:{node_version}-alpine\n")
    } else {
        line.to_string()
    }
}

/// Copy the nginx template tree into `{base}/{name}`.
pub fn proxy_tree(
    base_dir: &Path,
    name: &str,
    overwrite: bool,
    no_overwrite: bool,
) -> Result<PathBuf> {
    template_tree(Path::new(NGINX_TEMPLATE_DIR), base_dir, name, overwrite, no_overwrite)
}

/// Copy the redis template tree into `{base}/{name}`.
pub fn cache_tree(
    base_dir: &Path,
    name: &str,
    overwrite: bool,
    no_overwrite: bool,
) -> Result<PathBuf> {
    template_tree(Path::new(REDIS_TEMPLATE_DIR), base_dir, name, overwrite, no_overwrite)
}

fn template_tree(
    template: &Path,
    base_dir: &Path,
    name: &str,
    overwrite: bool,
    no_overwrite: bool,
) -> Result<PathBuf> {
    let service_dir = base_dir.join(name);
    if clear_existing(&service_dir, overwrite, no_overwrite)? {
        fs::remove_dir_all(&service_dir)?;
    }
    copy_tree(template, &service_dir, &[])?;
    Ok(service_dir)
}

/// Recursively copy a directory tree, skipping top-level entries named in
/// `exclude`.
pub fn copy_tree(src: &Path, dst: &Path, exclude: &[&str]) -> Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let file_name = entry.file_name();
        if exclude.iter().any(|e| file_name == *e) {
            continue;
        }
        let target = dst.join(&file_name);
        if entry.file_type()?.is_dir() {
            copy_tree(&entry.path(), &target, &[])?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_line_rewritten() {
        assert_eq!(convert_dockerfile_line("FROM node:12\n", "18"), "FROM node:18-alpine\n");
        assert_eq!(convert_dockerfile_line("from node:latest\n", "18"), "FROM node:18-alpine\n");
        assert_eq!(convert_dockerfile_line("RUN npm ci\n", "18"), "RUN npm ci\n");
        assert_eq!(
            convert_dockerfile_line("FROM nginx:stable\n", "18"),
            "FROM nginx:stable\n"
        );
    }

    #[test]
    fn test_clear_existing_flag_matrix() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("present");
        std::fs::create_dir(&target).unwrap();

        assert!(clear_existing(&target, true, false).unwrap());
        assert!(matches!(
            clear_existing(&target, false, true),
            Err(Error::AlreadyExists(_))
        ));
        assert!(!clear_existing(&dir.path().join("absent"), false, false).unwrap());
    }

    #[test]
    fn test_copy_tree_with_exclusion() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir_all(src.join("nested")).unwrap();
        std::fs::write(src.join("a.txt"), "a").unwrap();
        std::fs::write(src.join("nested/b.txt"), "b").unwrap();
        std::fs::create_dir(src.join("build")).unwrap();
        std::fs::write(src.join("build/stale"), "x").unwrap();

        let dst = dir.path().join("dst");
        copy_tree(&src, &dst, &["build"]).unwrap();
        assert_eq!(std::fs::read_to_string(dst.join("a.txt")).unwrap(), "a");
        assert_eq!(std::fs::read_to_string(dst.join("nested/b.txt")).unwrap(), "b");
        assert!(!dst.join("build").exists());
    }
}
