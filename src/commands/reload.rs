//! `reload` — merge new settings into a service definition.

use crate::commands::{group_name, split_env_entry, GlobalOpts};
use crate::error::Result;
use crate::services::ServiceRegistry;

#[derive(Debug)]
pub struct ReloadOptions {
    pub name: String,
    /// Extra YAML settings merged over the existing spec.
    pub overlay: Option<serde_yaml::Value>,
    pub volumes: Vec<String>,
    pub environment: Vec<String>,
    /// Rebuild every container instead of just this one.
    pub forced: bool,
}

/// Returns the services to rebuild; empty means "all of them" (forced).
pub fn run(
    registry: &mut ServiceRegistry,
    opts: &GlobalOpts,
    reload: &ReloadOptions,
) -> Result<Vec<String>> {
    let network = group_name(&opts.directory)?;
    let fullname = format!("{network}.{}", reload.name);

    if let Some(overlay) = &reload.overlay {
        registry.merge_service_settings(&fullname, overlay)?;
    }
    let spec = registry.service_spec_mut(&fullname)?;
    spec.volumes.extend(reload.volumes.iter().cloned());
    for entry in &reload.environment {
        let (var, value) = split_env_entry(entry)?;
        spec.set_environment_variable(var, value);
    }

    tracing::info!(service = %fullname, forced = reload.forced, "Settings reloaded");
    if reload.forced {
        Ok(Vec::new())
    } else {
        Ok(vec![fullname])
    }
}
