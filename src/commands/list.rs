//! `ls` — print the group's services and routes.

use crate::commands::{group_name, GlobalOpts};
use crate::error::Result;
use crate::process::docker;
use crate::services::ServiceRegistry;

pub fn run(registry: &ServiceRegistry, opts: &GlobalOpts) -> Result<()> {
    let network = group_name(&opts.directory)?;
    println!("Services in group {network}:");
    for (name, role, spec) in registry.iter() {
        let image = spec.image.as_deref().unwrap_or("-");
        let status = docker::status(name).unwrap_or_else(|_| "not created".to_string());
        println!("  {name} [{}] image={image} ({status})", role.as_str());
        for entry in registry.routes().iter().filter(|e| e.backend() == name) {
            println!("    {} -> {}", entry.path(), entry.upstream());
        }
    }
    Ok(())
}
