//! `add` — register a new git-backed service and route it.

use clap::ValueEnum;

use crate::build::{self, BuildKind};
use crate::commands::{group_name, split_env_entry, GlobalOpts};
use crate::document::ServiceSpec;
use crate::error::Result;
use crate::process::git;
use crate::scaffold;
use crate::services::{ServiceRegistry, ServiceRole};

/// Kind of service being added; selects the scaffolded Dockerfile and the
/// recorded compile script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ServerType {
    Node,
    Nginx,
}

impl ServerType {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Nginx => "nginx",
        }
    }
}

#[derive(Debug)]
pub struct AddOptions {
    /// Short service name; the full name is `{group}.{name}`.
    pub name: String,
    pub git_url: String,
    pub branch: Option<String>,
    /// Paths routed to the new service.
    pub url_paths: Vec<String>,
    /// Port the service listens on inside the network.
    pub port: u16,
    /// Extra YAML settings merged over the generated spec.
    pub overlay: Option<serde_yaml::Value>,
    pub server_type: ServerType,
    pub node_version: String,
    pub volumes: Vec<String>,
    pub environment: Vec<String>,
    pub build_environment: Vec<String>,
}

/// Register the service, route its paths, then clone/scaffold/compile.
///
/// The registry is mutated first: a duplicate path or malformed argument
/// aborts before anything touches the filesystem or docker.
pub fn run(
    registry: &mut ServiceRegistry,
    opts: &GlobalOpts,
    add: &AddOptions,
) -> Result<Vec<String>> {
    let network = group_name(&opts.directory)?;
    let fullname = format!("{network}.{}", add.name);

    for path in &add.url_paths {
        registry.add_service_route(path, &fullname, add.port)?;
    }
    registry.set_compile_script(&fullname, add.server_type.tag());
    for entry in &add.build_environment {
        let (var, value) = split_env_entry(entry)?;
        registry.set_build_environment_variable(&fullname, var, value);
    }

    let mut spec = ServiceSpec::scaffolded(&network, &add.name);
    if let Some(overlay) = &add.overlay {
        spec.merge_overlay(overlay)?;
    }
    spec.volumes.extend(add.volumes.iter().cloned());
    for entry in &add.environment {
        let (var, value) = split_env_entry(entry)?;
        spec.set_environment_variable(var, value);
    }
    registry.insert_service(&fullname, ServiceRole::Backend, spec);

    tracing::info!(
        service = %fullname,
        paths = ?add.url_paths,
        port = add.port,
        "Service registered"
    );

    let mut git_settings = vec![add.git_url.clone()];
    if let Some(branch) = &add.branch {
        git_settings.push("--branch".to_string());
        git_settings.push(branch.clone());
    }
    let checkout = git::clone_into(
        &opts.directory,
        &fullname,
        &git_settings,
        opts.overwrite,
        opts.effective_no_overwrite(),
    )?;

    match add.server_type {
        ServerType::Node => {
            scaffold::node_dockerfile(
                &opts.directory,
                &fullname,
                &add.node_version,
                opts.overwrite,
                opts.effective_no_overwrite(),
            )?;
        }
        ServerType::Nginx => {
            scaffold::proxy_tree(
                &opts.directory,
                &fullname,
                opts.overwrite,
                opts.effective_no_overwrite(),
            )?;
        }
    }

    let kind = BuildKind::from_tag(registry.compile_script(&fullname));
    build::run_build(kind, &checkout, &registry.build_environment(&fullname))?;

    Ok(vec![fullname])
}
