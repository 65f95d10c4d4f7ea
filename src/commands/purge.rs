//! `purge` — tear down the group's docker networks.

use crate::commands::GlobalOpts;
use crate::error::Result;
use crate::process::docker;
use crate::services::ServiceRegistry;

/// Remove every network the group owns. Attached containers block removal
/// unless `forced`, which removes them first.
pub fn run(registry: &ServiceRegistry, _opts: &GlobalOpts, forced: bool) -> Result<()> {
    for network in registry.network_names() {
        let containers = match docker::network_containers(network) {
            Ok(containers) => containers,
            Err(err) => {
                tracing::warn!(network, %err, "Network not inspectable, skipping");
                continue;
            }
        };
        if !containers.is_empty() {
            if !forced {
                tracing::warn!(
                    network,
                    containers = containers.len(),
                    "Network still has containers; use --force to remove them"
                );
                continue;
            }
            for container in &containers {
                docker::remove_container(container, true)?;
            }
        }
        docker::remove_networks(&[network.to_string()])?;
        tracing::info!(network, "Network removed");
    }
    Ok(())
}
