//! Configuration loading from YAML or KDL documents.
//!
//! YAML follows the tree one to one:
//!
//! ```yaml
//! teams:
//!   - name: platform
//!     services:
//!       - name: registry
//!         environments:
//!           - name: dev
//!             location: westeurope
//!             harbor:
//!               projects:
//!                 - name: images
//!                   args:
//!                     storage_quota: 10
//! ```
//!
//! The KDL form nests nodes the same way. A resource node's children are its
//! arguments; a resource node without children has none:
//!
//! ```kdl
//! team "platform" {
//!     service "registry" {
//!         environment "dev" location="westeurope" {
//!             harbor {
//!                 project "legacy" id="12"
//!                 project "images" {
//!                     storage-quota 10
//!                 }
//!             }
//!         }
//!     }
//! }
//! ```

use kdl::{KdlDocument, KdlNode, KdlValue};
use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};
use std::path::Path;
use tracing::{debug, warn};

use crate::harbor::Harbor;
use crate::tree::{Config, Environment, ResourceEntry, Service, Team};
use crate::{ConfigError, ConfigResult};

/// Document formats understood by [`load_config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Kdl,
}

impl Format {
    /// Pick a format from a file extension.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Ok(Format::Yaml),
            Some("kdl") => Ok(Format::Kdl),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}

/// Read, parse and validate a configuration file.
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<Config> {
    let path = path.as_ref();
    let format = Format::from_path(path)?;
    let content = std::fs::read_to_string(path)?;
    debug!(path = %path.display(), ?format, "Loading configuration");
    parse_config(&content, format)
}

/// Parse and validate a configuration document.
pub fn parse_config(content: &str, format: Format) -> ConfigResult<Config> {
    let config = match format {
        Format::Yaml => parse_yaml(content)?,
        Format::Kdl => parse_kdl(content)?,
    };
    config.validate()?;
    Ok(config)
}

pub fn parse_yaml(content: &str) -> ConfigResult<Config> {
    Ok(serde_yaml::from_str(content)?)
}

pub fn parse_kdl(content: &str) -> ConfigResult<Config> {
    let doc: KdlDocument = content.parse()?;

    let mut teams = Vec::new();
    for node in doc.nodes() {
        match node.name().value() {
            "team" => teams.push(parse_team(node)?),
            _ => {} // Ignore unknown nodes
        }
    }

    Ok(Config { teams })
}

fn parse_team(node: &KdlNode) -> ConfigResult<Team> {
    let name = required_name(node, "team")?;
    let mut services = Vec::new();

    for child in child_nodes(node) {
        if child.name().value() == "service" {
            services.push(parse_service(child)?);
        }
    }

    Ok(Team { name, services })
}

fn parse_service(node: &KdlNode) -> ConfigResult<Service> {
    let name = required_name(node, "service")?;
    let mut environments = Vec::new();

    for child in child_nodes(node) {
        if child.name().value() == "environment" {
            environments.push(parse_environment(child)?);
        }
    }

    Ok(Service { name, environments })
}

fn parse_environment(node: &KdlNode) -> ConfigResult<Environment> {
    let name = required_name(node, "environment")?;
    let mut location = get_string_prop(node, "location");
    let mut harbor = None;

    for child in child_nodes(node) {
        match child.name().value() {
            "location" => location = get_first_string_arg(child),
            "harbor" => harbor = Some(parse_harbor(child)?),
            _ => {}
        }
    }

    Ok(Environment {
        name,
        location,
        harbor,
    })
}

fn parse_harbor(node: &KdlNode) -> ConfigResult<Harbor> {
    let mut harbor = Harbor::default();

    for child in child_nodes(node) {
        match child.name().value() {
            "project" => harbor
                .projects
                .get_or_insert_with(Vec::new)
                .push(parse_entry(child, "project")?),
            "registry" => harbor
                .registries
                .get_or_insert_with(Vec::new)
                .push(parse_entry(child, "registry")?),
            other => warn!(node = %other, "Ignoring unknown harbor node"),
        }
    }

    Ok(harbor)
}

fn parse_entry<A: DeserializeOwned>(node: &KdlNode, kind: &str) -> ConfigResult<ResourceEntry<A>> {
    let name = required_name(node, kind)?;

    let id = match node.get("id") {
        None => None,
        Some(value) => match kdl_to_json(value) {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => {
                return Err(ConfigError::InvalidValue {
                    field: format!("{} '{}' id", kind, name),
                    message: "expected a string or an integer".to_string(),
                });
            }
        },
    };

    let args = match node.children() {
        Some(children) => Some(serde_json::from_value(Value::Object(nodes_to_map(children)))?),
        None => None,
    };

    Ok(ResourceEntry { name, id, args })
}

/// Turn argument nodes into a JSON object.
///
/// `storage-quota 10` becomes `"storage_quota": 10`; a node with several
/// arguments or repeated nodes become arrays; a node with children becomes a
/// nested object.
fn nodes_to_map(doc: &KdlDocument) -> Map<String, Value> {
    let mut map = Map::new();

    for node in doc.nodes() {
        let key = node.name().value().replace('-', "_");
        let value = match node.children() {
            Some(children) => Value::Object(nodes_to_map(children)),
            None => {
                let mut args: Vec<Value> = node
                    .entries()
                    .iter()
                    .filter(|e| e.name().is_none())
                    .map(|e| kdl_to_json(e.value()))
                    .collect();
                match args.len() {
                    0 => Value::Null,
                    1 => args.remove(0),
                    _ => Value::Array(args),
                }
            }
        };

        match map.get_mut(&key) {
            Some(Value::Array(existing)) => existing.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                map.insert(key, value);
            }
        }
    }

    map
}

fn kdl_to_json(value: &KdlValue) -> Value {
    if let Some(s) = value.as_string() {
        Value::String(s.to_string())
    } else if let Some(b) = value.as_bool() {
        Value::Bool(b)
    } else if let Some(i) = value.as_integer() {
        i64::try_from(i)
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(i.to_string()))
    } else if let Some(f) = value.as_float() {
        Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
    } else {
        Value::Null
    }
}

// Helper functions for extracting values from KDL nodes

fn child_nodes(node: &KdlNode) -> impl Iterator<Item = &KdlNode> {
    node.children().into_iter().flat_map(|doc| doc.nodes().iter())
}

fn required_name(node: &KdlNode, kind: &str) -> ConfigResult<String> {
    get_first_string_arg(node).ok_or_else(|| ConfigError::MissingField(format!("{} name", kind)))
}

fn get_first_string_arg(node: &KdlNode) -> Option<String> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}

fn get_string_prop(node: &KdlNode, name: &str) -> Option<String> {
    node.get(name)
        .and_then(|v| v.as_string())
        .map(|s| s.to_string())
}
