//! `rebuild-portal` — re-render the proxy's site configuration.

use crate::commands::GlobalOpts;
use crate::error::Result;
use crate::nginx;
use crate::services::ServiceRegistry;

/// Site file name under `sites-available` / `sites-enabled`.
pub const PORTAL_SITE: &str = "portal";

pub fn run(registry: &ServiceRegistry, opts: &GlobalOpts) -> Result<Vec<String>> {
    tracing::info!(proxy = %registry.proxy_name(), "Building portal config");
    let routes = registry.routes().sorted_for_rendering();
    nginx::render_site(&opts.directory, registry.proxy_name(), PORTAL_SITE, &routes)?;
    Ok(vec![registry.proxy_name().to_string()])
}
