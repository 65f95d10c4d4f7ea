//! `remove` — drop a service definition, optionally cleaning its routes.

use crate::commands::{group_name, GlobalOpts};
use crate::error::Result;
use crate::services::ServiceRegistry;

/// Remove the service named `{group}.{name}`.
///
/// Routes are only dropped with `clean`; without it the routing entries stay
/// behind on purpose, so a later re-add under the same name picks them up.
pub fn run(
    registry: &mut ServiceRegistry,
    opts: &GlobalOpts,
    name: &str,
    clean: bool,
) -> Result<Vec<String>> {
    let network = group_name(&opts.directory)?;
    let fullname = format!("{network}.{name}");
    registry.service(&fullname)?;

    if clean {
        registry.remove_service_routes(&fullname);
    }
    registry.remove_service(&fullname);

    tracing::info!(service = %fullname, clean, "Service removed");
    Ok(vec![registry.proxy_name().to_string()])
}
