//! `update` — refresh service checkouts and recompile.

use crate::build::{self, BuildKind};
use crate::commands::{group_name, GlobalOpts};
use crate::error::{Error, Result};
use crate::process::git;
use crate::services::ServiceRegistry;

#[derive(Debug)]
pub struct UpdateOptions {
    /// Short service names to update.
    pub names: Vec<String>,
    pub git_url: Option<String>,
    /// Branch to check out; when absent the checkout's current branch is
    /// kept, defaulting to `production` for a fresh one.
    pub branch: Option<String>,
}

pub fn run(
    registry: &ServiceRegistry,
    opts: &GlobalOpts,
    update: &UpdateOptions,
) -> Result<Vec<String>> {
    let network = group_name(&opts.directory)?;
    let mut affected = Vec::new();

    for name in &update.names {
        let fullname = format!("{network}.{name}");
        tracing::info!(service = %fullname, "Updating");
        if !registry.contains(&fullname) {
            return Err(Error::UnknownBackend(fullname));
        }

        let branch = match &update.branch {
            Some(branch) => branch.clone(),
            None => match git::current_branch(&opts.directory, &fullname)? {
                Some(branch) => {
                    tracing::info!(service = %fullname, branch = %branch, "Found branch");
                    branch
                }
                None => "production".to_string(),
            },
        };

        let mut settings = Vec::new();
        if let Some(url) = &update.git_url {
            settings.push(url.clone());
        }
        git::update(&opts.directory, &fullname, Some(&branch), &settings)?;

        let checkout = git::checkout_path(&opts.directory, &fullname);
        let kind = BuildKind::from_tag(registry.compile_script(&fullname));
        build::run_build(kind, &checkout, &registry.build_environment(&fullname))?;

        if !affected.contains(&fullname) {
            affected.push(fullname);
        }
    }

    Ok(affected)
}
