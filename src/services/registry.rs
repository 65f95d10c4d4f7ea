//! The typed in-memory view of one group's services.

use std::collections::BTreeMap;

use crate::document::schema::{
    ComposeFile, MetaSection, NetworkSpec, PortMapping, ServiceData, ServiceSpec,
};
use crate::error::{Error, Result};
use crate::routing::{RoutingTable, ROUTES_ENV_VAR};

/// Role of a registered service.
///
/// `Backend` services are git-backed applications; `Cache` covers
/// infrastructure sidecars (redis) that are built from a static template and
/// carry no source checkout. The proxy is not represented here: it lives in
/// its own typed slot on the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceRole {
    Proxy,
    Backend,
    Cache,
}

impl ServiceRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Proxy => "proxy",
            Self::Backend => "backend",
            Self::Cache => "cache",
        }
    }
}

/// A non-proxy service definition.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceEntry {
    pub role: ServiceRole,
    pub spec: ServiceSpec,
}

/// The distinguished reverse-proxy service. Sole owner of the routing table.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyService {
    pub name: String,
    pub spec: ServiceSpec,
    pub routes: RoutingTable,
}

/// All services of one group plus the group-level document fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceRegistry {
    version: String,
    networks: BTreeMap<String, NetworkSpec>,
    proxy: ProxyService,
    services: BTreeMap<String, ServiceEntry>,
    service_data: BTreeMap<String, ServiceData>,
}

impl ServiceRegistry {
    /// Build the registry from a parsed document.
    ///
    /// `override_main` replaces the document's recorded proxy name (the CLI's
    /// `--reverse-proxy` flag). The proxy's `DYNAMIC_SERVER` line is the
    /// authoritative routing state; the persisted `locations` map must agree
    /// with it or the document is rejected.
    pub fn from_document(mut doc: ComposeFile, override_main: Option<&str>) -> Result<Self> {
        let main_name = override_main
            .map(str::to_string)
            .unwrap_or_else(|| doc.meta.main.clone());
        let proxy_spec = doc
            .services
            .remove(&main_name)
            .ok_or_else(|| Error::UnknownBackend(main_name.clone()))?;

        let line = proxy_spec
            .environment_variable(ROUTES_ENV_VAR)
            .unwrap_or_default()
            .to_string();
        let routes = RoutingTable::parse_from_line(&line)?;
        if doc.meta.locations != routes.locations() {
            return Err(Error::Format(format!(
                "x-meta.locations diverges from the routing table of {main_name}"
            )));
        }

        let service_data = doc.meta.service_data;
        let services = doc
            .services
            .into_iter()
            .map(|(name, spec)| {
                let role = match service_data.get(&name) {
                    Some(data) if data.compile_script.is_some() => ServiceRole::Backend,
                    _ => ServiceRole::Cache,
                };
                (name, ServiceEntry { role, spec })
            })
            .collect();

        Ok(Self {
            version: doc.version,
            networks: doc.networks,
            proxy: ProxyService {
                name: main_name,
                spec: proxy_spec,
                routes,
            },
            services,
            service_data,
        })
    }

    /// Fresh group: one bridge network, an nginx proxy publishing
    /// `port:80` with an empty routing table, and a redis cache sidecar.
    pub fn new_group(
        network: &str,
        port: u16,
        proxy_overlay: Option<&serde_yaml::Value>,
        proxy_environment: &[String],
    ) -> Result<Self> {
        let mut proxy_spec = ServiceSpec::scaffolded(network, "nginx");
        proxy_spec.ports.push(PortMapping::short(port, 80));
        proxy_spec.set_environment_variable(ROUTES_ENV_VAR, "");
        if let Some(overlay) = proxy_overlay {
            proxy_spec.merge_overlay(overlay)?;
        }
        for entry in proxy_environment {
            let (var, value) = entry.split_once('=').ok_or_else(|| {
                Error::Format(format!("environment entry {entry:?} is not KEY=VALUE"))
            })?;
            proxy_spec.set_environment_variable(var, value);
        }

        let proxy_name = proxy_spec
            .container_name
            .clone()
            .unwrap_or_else(|| format!("{network}.nginx"));
        let cache_spec = ServiceSpec::scaffolded(network, "redis");
        let cache_name = format!("{network}.redis");

        let mut service_data = BTreeMap::new();
        service_data.insert(
            proxy_name.clone(),
            ServiceData {
                compile_script: Some("react".to_string()),
                environment: BTreeMap::new(),
            },
        );

        let mut networks = BTreeMap::new();
        networks.insert(network.to_string(), NetworkSpec::bridge());

        let mut services = BTreeMap::new();
        services.insert(
            cache_name,
            ServiceEntry {
                role: ServiceRole::Cache,
                spec: cache_spec,
            },
        );

        Ok(Self {
            version: "3.7".to_string(),
            networks,
            proxy: ProxyService {
                name: proxy_name,
                spec: proxy_spec,
                routes: RoutingTable::new(),
            },
            services,
            service_data,
        })
    }

    /// Render the registry back into the persisted document shape. The
    /// proxy's environment line and the locations map are both produced from
    /// the routing table here, so the two views agree by construction.
    pub fn to_document(&self) -> ComposeFile {
        let mut services: BTreeMap<String, ServiceSpec> = self
            .services
            .iter()
            .map(|(name, entry)| (name.clone(), entry.spec.clone()))
            .collect();

        let mut proxy_spec = self.proxy.spec.clone();
        proxy_spec.set_environment_variable(ROUTES_ENV_VAR, &self.proxy.routes.serialize_to_line());
        services.insert(self.proxy.name.clone(), proxy_spec);

        ComposeFile {
            version: self.version.clone(),
            networks: self.networks.clone(),
            services,
            meta: MetaSection {
                main: self.proxy.name.clone(),
                service_data: self.service_data.clone(),
                locations: self.proxy.routes.locations(),
            },
        }
    }

    pub fn proxy(&self) -> &ProxyService {
        &self.proxy
    }

    pub fn proxy_name(&self) -> &str {
        &self.proxy.name
    }

    pub fn routes(&self) -> &RoutingTable {
        &self.proxy.routes
    }

    pub fn network_names(&self) -> impl Iterator<Item = &str> {
        self.networks.keys().map(String::as_str)
    }

    /// Route `path` on the proxy to `backend:port`.
    pub fn add_service_route(&mut self, path: &str, backend: &str, port: u16) -> Result<()> {
        self.proxy.routes.add_route(path, backend, port)
    }

    /// Drop every route targeting `backend`. Idempotent.
    pub fn remove_service_routes(&mut self, backend: &str) {
        self.proxy.routes.remove_routes_by_backend(backend);
    }

    /// Drop the route with exactly this path. No-op when absent.
    pub fn remove_route(&mut self, path: &str) {
        self.proxy.routes.remove_route(path);
    }

    pub fn contains(&self, name: &str) -> bool {
        name == self.proxy.name || self.services.contains_key(name)
    }

    /// Look up a non-proxy service.
    pub fn service(&self, name: &str) -> Result<&ServiceEntry> {
        self.services
            .get(name)
            .ok_or_else(|| Error::UnknownBackend(name.to_string()))
    }

    /// Mutable spec access for any service, the proxy included.
    pub fn service_spec_mut(&mut self, name: &str) -> Result<&mut ServiceSpec> {
        if name == self.proxy.name {
            return Ok(&mut self.proxy.spec);
        }
        self.services
            .get_mut(name)
            .map(|entry| &mut entry.spec)
            .ok_or_else(|| Error::UnknownBackend(name.to_string()))
    }

    /// Register (or replace) a service definition.
    pub fn insert_service(&mut self, name: &str, role: ServiceRole, spec: ServiceSpec) {
        self.services
            .insert(name.to_string(), ServiceEntry { role, spec });
    }

    /// Delete a service definition and its build metadata. Routes targeting
    /// the service are deliberately left in place; call
    /// [`Self::remove_service_routes`] first to drop them. No-op when absent.
    pub fn remove_service(&mut self, name: &str) {
        self.services.remove(name);
        self.service_data.remove(name);
    }

    /// All services with the proxy first, as `(name, role, spec)`.
    pub fn iter(&self) -> impl Iterator<Item = (&str, ServiceRole, &ServiceSpec)> {
        std::iter::once((self.proxy.name.as_str(), ServiceRole::Proxy, &self.proxy.spec)).chain(
            self.services
                .iter()
                .map(|(name, entry)| (name.as_str(), entry.role, &entry.spec)),
        )
    }

    /// Names of services built from a git checkout (compile script recorded).
    pub fn git_backed_names(&self) -> Vec<String> {
        self.service_data
            .iter()
            .filter(|(_, data)| data.compile_script.is_some())
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn compile_script(&self, name: &str) -> Option<&str> {
        self.service_data
            .get(name)
            .and_then(|data| data.compile_script.as_deref())
    }

    pub fn set_compile_script(&mut self, name: &str, tag: &str) {
        self.service_data
            .entry(name.to_string())
            .or_default()
            .compile_script = Some(tag.to_string());
    }

    pub fn build_environment(&self, name: &str) -> BTreeMap<String, String> {
        self.service_data
            .get(name)
            .map(|data| data.environment.clone())
            .unwrap_or_default()
    }

    pub fn set_build_environment_variable(&mut self, name: &str, var: &str, value: &str) {
        self.service_data
            .entry(name.to_string())
            .or_default()
            .environment
            .insert(var.to_string(), value.to_string());
    }

    pub fn clear_build_environment(&mut self, name: &str) {
        if let Some(data) = self.service_data.get_mut(name) {
            data.environment.clear();
        }
    }

    /// Shallow-merge raw YAML settings into a service spec (proxy included).
    pub fn merge_service_settings(
        &mut self,
        name: &str,
        overlay: &serde_yaml::Value,
    ) -> Result<()> {
        self.service_spec_mut(name)?.merge_overlay(overlay)
    }
}
