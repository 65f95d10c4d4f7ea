//! Compose document schema definitions.
//!
//! This module defines the on-disk document structure. All types derive Serde
//! traits for (de)serialization from the YAML document.
//!
//! # Design Decisions
//! - Unknown service keys (`deploy` extensions, labels, …) are preserved
//!   through a flattened map so a round-trip never loses data
//! - `environment` accepts both compose forms (map or `KEY=VALUE` list) and is
//!   always written back as a map
//! - `ports` round-trips both the short string form and the long map form

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Root of the persisted document (`docker-compose.yml`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposeFile {
    /// Compose format version.
    pub version: String,

    /// Named networks; one bridge network per group.
    #[serde(default)]
    pub networks: BTreeMap<String, NetworkSpec>,

    /// Service definitions keyed by full service name.
    #[serde(default)]
    pub services: BTreeMap<String, ServiceSpec>,

    /// Tool-owned metadata section.
    #[serde(rename = "x-meta")]
    pub meta: MetaSection,
}

/// A named docker network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub driver: String,
}

impl NetworkSpec {
    pub fn bridge() -> Self {
        Self {
            driver: "bridge".to_string(),
        }
    }
}

/// One service definition in the `services` map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceSpec {
    /// Build context, for services built from a local checkout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildSpec>,

    /// Container name; also the key under which the service is registered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_name: Option<String>,

    /// Image tag to build or pull.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Restart policy string (`unless-stopped` for generated services).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restart: Option<String>,

    /// Deployment settings for generated services.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deploy: Option<DeploySpec>,

    /// Networks the container joins.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub networks: Vec<String>,

    /// Published ports.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<PortMapping>,

    /// Bind mounts and named volumes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<String>,

    /// Container environment, normalized to a map.
    #[serde(
        default,
        deserialize_with = "env_map::deserialize",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub environment: BTreeMap<String, String>,

    /// Any keys this tool does not interpret, preserved verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl ServiceSpec {
    /// Default spec for a generated service: built from `./{network}.{name}/`,
    /// named and tagged `{network}.{name}`, member of the group network.
    pub fn scaffolded(network: &str, name: &str) -> Self {
        let fullname = format!("{network}.{name}");
        Self {
            build: Some(BuildSpec {
                context: format!("./{fullname}/"),
            }),
            container_name: Some(fullname.clone()),
            image: Some(fullname),
            restart: Some("unless-stopped".to_string()),
            deploy: Some(DeploySpec::default()),
            networks: vec![network.to_string()],
            ..Self::default()
        }
    }

    pub fn environment_variable(&self, var: &str) -> Option<&str> {
        self.environment.get(var).map(String::as_str)
    }

    pub fn set_environment_variable(&mut self, var: &str, value: &str) {
        self.environment.insert(var.to_string(), value.to_string());
    }

    /// Build context path, when the service is built from source.
    pub fn source_path(&self) -> Option<&str> {
        self.build.as_ref().map(|b| b.context.as_str())
    }

    /// Shallow-merge raw YAML settings over this spec; top-level keys from the
    /// overlay replace existing ones, everything else is untouched.
    pub fn merge_overlay(&mut self, overlay: &serde_yaml::Value) -> Result<(), Error> {
        let serde_yaml::Value::Mapping(overlay) = overlay else {
            return Err(Error::Format(
                "service settings overlay must be a mapping".to_string(),
            ));
        };
        let mut base = serde_yaml::to_value(&*self)?;
        let serde_yaml::Value::Mapping(base_map) = &mut base else {
            return Err(Error::Format("service spec is not a mapping".to_string()));
        };
        for (key, value) in overlay {
            base_map.insert(key.clone(), value.clone());
        }
        *self = serde_yaml::from_value(base)?;
        Ok(())
    }
}

/// Build settings for a service compiled from a local checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildSpec {
    pub context: String,
}

/// Deploy block emitted for generated services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploySpec {
    pub restart_policy: RestartPolicy,
}

impl Default for DeploySpec {
    fn default() -> Self {
        Self {
            restart_policy: RestartPolicy {
                condition: "any".to_string(),
                window: "60s".to_string(),
            },
        }
    }
}

/// Restart policy for the deploy block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestartPolicy {
    pub condition: String,
    pub window: String,
}

/// One published port, in either compose form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortMapping {
    /// Short form, `published:target[/protocol]`.
    Short(String),
    /// Long form with explicit fields.
    Long {
        #[serde(skip_serializing_if = "Option::is_none")]
        mode: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        protocol: Option<String>,
        target: u16,
        #[serde(skip_serializing_if = "Option::is_none")]
        published: Option<String>,
    },
}

impl PortMapping {
    /// Short-form mapping `published:target`.
    pub fn short(published: u16, target: u16) -> Self {
        Self::Short(format!("{published}:{target}"))
    }

    /// The container-side port, when it can be determined.
    pub fn target(&self) -> Option<u16> {
        match self {
            Self::Short(s) => {
                let without_protocol = s.split('/').next().unwrap_or(s);
                without_protocol.rsplit(':').next()?.parse().ok()
            }
            Self::Long { target, .. } => Some(*target),
        }
    }
}

/// The `x-meta` section: tool-owned state the compose format has no slot for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaSection {
    /// Full name of the proxy service that owns the routing table.
    pub main: String,

    /// Per-service build metadata.
    #[serde(default, rename = "docker_data")]
    pub service_data: BTreeMap<String, ServiceData>,

    /// Human-readable `path → "backend:port"` view of the routing table.
    /// Written as a projection of the table; never edited independently.
    #[serde(default)]
    pub locations: BTreeMap<String, String>,
}

/// Build metadata for one service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceData {
    /// Tag selecting how the checkout is compiled; present iff the service is
    /// git-backed.
    #[serde(rename = "compile-script", skip_serializing_if = "Option::is_none")]
    pub compile_script: Option<String>,

    /// Environment passed to the build container.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,
}

mod env_map {
    //! `environment` deserializer accepting both compose forms.

    use std::collections::BTreeMap;

    use serde::de::{Deserializer, Error as DeError};
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum EnvRepr {
        Map(BTreeMap<String, serde_yaml::Value>),
        List(Vec<String>),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match EnvRepr::deserialize(deserializer)? {
            EnvRepr::Map(map) => map
                .into_iter()
                .map(|(key, value)| Ok((key, scalar_to_string(value)?)))
                .collect(),
            EnvRepr::List(items) => items
                .into_iter()
                .map(|item| {
                    let (key, value) = item.split_once('=').ok_or_else(|| {
                        DeError::custom(format!("environment entry {item:?} is not KEY=VALUE"))
                    })?;
                    Ok((key.to_string(), value.to_string()))
                })
                .collect(),
        }
    }

    fn scalar_to_string<E: DeError>(value: serde_yaml::Value) -> Result<String, E> {
        match value {
            serde_yaml::Value::String(s) => Ok(s),
            serde_yaml::Value::Number(n) => Ok(n.to_string()),
            serde_yaml::Value::Bool(b) => Ok(b.to_string()),
            serde_yaml::Value::Null => Ok(String::new()),
            other => Err(DeError::custom(format!(
                "environment value {other:?} is not a scalar"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_list_form_normalizes_to_map() {
        let yaml = "environment:\n  - FOO=bar\n  - EMPTY=\n";
        let spec: ServiceSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(spec.environment["FOO"], "bar");
        assert_eq!(spec.environment["EMPTY"], "");
    }

    #[test]
    fn test_environment_map_form_with_scalars() {
        let yaml = "environment:\n  PORT: 1337\n  DEBUG: true\n  NAME: api\n";
        let spec: ServiceSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(spec.environment["PORT"], "1337");
        assert_eq!(spec.environment["DEBUG"], "true");
        assert_eq!(spec.environment["NAME"], "api");
    }

    #[test]
    fn test_unknown_keys_survive_round_trip() {
        let yaml = "image: x\nlabels:\n  a: b\n";
        let spec: ServiceSpec = serde_yaml::from_str(yaml).unwrap();
        let out = serde_yaml::to_string(&spec).unwrap();
        let back: ServiceSpec = serde_yaml::from_str(&out).unwrap();
        assert_eq!(back, spec);
        assert!(back.extra.contains_key("labels"));
    }

    #[test]
    fn test_port_forms() {
        let short: PortMapping = serde_yaml::from_str("\"8080:80/tcp\"").unwrap();
        assert_eq!(short.target(), Some(80));

        let long: PortMapping =
            serde_yaml::from_str("target: 80\npublished: \"8080\"\nmode: host\n").unwrap();
        assert_eq!(long.target(), Some(80));

        assert_eq!(PortMapping::short(8080, 80), PortMapping::Short("8080:80".into()));
    }

    #[test]
    fn test_scaffolded_spec_defaults() {
        let spec = ServiceSpec::scaffolded("group", "api");
        assert_eq!(spec.container_name.as_deref(), Some("group.api"));
        assert_eq!(spec.image.as_deref(), Some("group.api"));
        assert_eq!(spec.source_path(), Some("./group.api/"));
        assert_eq!(spec.restart.as_deref(), Some("unless-stopped"));
        assert_eq!(spec.networks, vec!["group".to_string()]);
    }

    #[test]
    fn test_merge_overlay_replaces_top_level_keys() {
        let mut spec = ServiceSpec::scaffolded("group", "api");
        let overlay: serde_yaml::Value =
            serde_yaml::from_str("image: custom/image\nvolumes:\n  - ./data:/data\n").unwrap();
        spec.merge_overlay(&overlay).unwrap();
        assert_eq!(spec.image.as_deref(), Some("custom/image"));
        assert_eq!(spec.volumes, vec!["./data:/data".to_string()]);
        // untouched keys survive
        assert_eq!(spec.container_name.as_deref(), Some("group.api"));
    }

    #[test]
    fn test_merge_overlay_rejects_non_mapping() {
        let mut spec = ServiceSpec::default();
        let overlay: serde_yaml::Value = serde_yaml::from_str("- a\n- b\n").unwrap();
        assert!(spec.merge_overlay(&overlay).is_err());
    }
}
