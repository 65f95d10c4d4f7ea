//! `create` — bootstrap a new group: proxy, cache and frontend.

use crate::build::{self, BuildKind};
use crate::commands::{group_name, split_env_entry, GlobalOpts};
use crate::error::Result;
use crate::process::git;
use crate::scaffold;
use crate::services::ServiceRegistry;

#[derive(Debug)]
pub struct CreateOptions {
    /// Git repository of the frontend served by the proxy.
    pub git_url: String,
    pub branch: Option<String>,
    /// Port the proxy publishes on the host.
    pub port: u16,
    /// Extra YAML settings merged over the generated proxy spec.
    pub overlay: Option<serde_yaml::Value>,
    pub overwrite: bool,
    pub environment: Vec<String>,
    pub build_environment: Vec<String>,
}

/// Build a fresh registry with the default proxy and cache, materialize their
/// directories, then clone and compile the frontend into the proxy.
pub fn run(opts: &GlobalOpts, create: &CreateOptions) -> Result<(ServiceRegistry, Vec<String>)> {
    let network = group_name(&opts.directory)?;
    let mut registry = ServiceRegistry::new_group(
        &network,
        create.port,
        create.overlay.as_ref(),
        &create.environment,
    )?;
    let proxy = registry.proxy_name().to_string();
    let cache = format!("{network}.redis");

    for entry in &create.build_environment {
        let (var, value) = split_env_entry(entry)?;
        registry.set_build_environment_variable(&proxy, var, value);
    }

    let overwrite = opts.overwrite || create.overwrite;
    let no_overwrite = opts.effective_no_overwrite();
    scaffold::proxy_tree(&opts.directory, &proxy, overwrite, no_overwrite)?;
    scaffold::cache_tree(&opts.directory, &cache, overwrite, no_overwrite)?;

    let mut git_settings = vec![create.git_url.clone()];
    if let Some(branch) = &create.branch {
        git_settings.push("--branch".to_string());
        git_settings.push(branch.clone());
    }
    let checkout = git::clone_into(&opts.directory, &proxy, &git_settings, overwrite, no_overwrite)?;

    let kind = BuildKind::from_tag(registry.compile_script(&proxy));
    build::run_build(kind, &checkout, &registry.build_environment(&proxy))?;

    tracing::info!(group = %network, proxy = %proxy, "Group created");
    Ok((registry, vec![proxy, cache]))
}
