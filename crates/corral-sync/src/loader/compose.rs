//! rancher-compose.yml and docker-compose.yml parsing

use crate::error::Result;
use corral_core::types::{Question, ServiceBinding};
use serde::Deserialize;
use serde_yaml_ng::{Mapping, Value};
use std::collections::BTreeMap;

/// Key of the catalog section inside rancher-compose.yml
const CATALOG_SECTION: &str = ".catalog";

/// Parsed rancher-compose.yml
#[derive(Debug, Default, PartialEq)]
pub struct RancherCompose {
    pub name: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub minimum_rancher_version: Option<String>,
    pub maximum_rancher_version: Option<String>,
    pub upgrade_from: Option<String>,
    pub questions: Vec<Question>,

    /// Scale of every service declared next to the catalog section
    pub scales: BTreeMap<String, u32>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogSection {
    #[serde(default)]
    name: Option<Value>,
    #[serde(default)]
    version: Option<Value>,
    #[serde(default)]
    description: Option<Value>,
    #[serde(default)]
    minimum_rancher_version: Option<Value>,
    #[serde(default)]
    maximum_rancher_version: Option<Value>,
    #[serde(default)]
    upgrade_from: Option<Value>,
    #[serde(default)]
    questions: Vec<Question>,
}

/// Parse the contents of a rancher-compose.yml
pub fn parse_rancher_compose(content: &str) -> Result<RancherCompose> {
    let doc: Value = serde_yaml_ng::from_str(content)?;
    let mut compose = RancherCompose::default();

    let Value::Mapping(entries) = doc else {
        return Ok(compose);
    };

    for (key, value) in entries {
        let Some(key) = key.as_str() else {
            continue;
        };

        if key == CATALOG_SECTION {
            let section: CatalogSection = serde_yaml_ng::from_value(value)?;
            compose.name = section.name.as_ref().and_then(scalar_to_string);
            compose.version = section.version.as_ref().and_then(scalar_to_string);
            compose.description = section.description.as_ref().and_then(scalar_to_string);
            compose.minimum_rancher_version = section
                .minimum_rancher_version
                .as_ref()
                .and_then(scalar_to_string);
            compose.maximum_rancher_version = section
                .maximum_rancher_version
                .as_ref()
                .and_then(scalar_to_string);
            compose.upgrade_from = section.upgrade_from.as_ref().and_then(scalar_to_string);
            compose.questions = section.questions;
        } else {
            let scale = value
                .get("scale")
                .and_then(Value::as_u64)
                .and_then(|s| u32::try_from(s).ok())
                .unwrap_or(0);
            compose.scales.insert(key.to_string(), scale);
        }
    }

    Ok(compose)
}

/// Parse the labels and ports of every service in a docker-compose.yml
///
/// Both the v1 layout (services at top level) and the v2 layout (services
/// under `services:` next to a `version:` key) are understood.
pub fn parse_docker_compose(content: &str) -> Result<BTreeMap<String, ServiceBinding>> {
    let doc: Value = serde_yaml_ng::from_str(content)?;
    let mut services = BTreeMap::new();

    let Some(root) = doc.as_mapping() else {
        return Ok(services);
    };

    let service_map: &Mapping = match (root.get("version"), root.get("services")) {
        (Some(_), Some(Value::Mapping(nested))) => nested,
        _ => root,
    };

    for (name, definition) in service_map {
        let (Some(name), Some(definition)) = (name.as_str(), definition.as_mapping()) else {
            continue;
        };

        services.insert(
            name.to_string(),
            ServiceBinding {
                labels: definition.get("labels").map(parse_labels).unwrap_or_default(),
                ports: definition.get("ports").map(parse_ports).unwrap_or_default(),
                scale: 0,
            },
        );
    }

    Ok(services)
}

/// Merge rancher-compose scales with docker-compose labels and ports
pub(crate) fn merge_bindings(
    scales: &BTreeMap<String, u32>,
    mut docker: BTreeMap<String, ServiceBinding>,
) -> BTreeMap<String, ServiceBinding> {
    for (name, scale) in scales {
        docker.entry(name.clone()).or_default().scale = *scale;
    }
    docker
}

fn parse_labels(value: &Value) -> BTreeMap<String, String> {
    match value {
        Value::Mapping(map) => map
            .iter()
            .filter_map(|(k, v)| {
                Some((scalar_to_string(k)?, scalar_to_string(v).unwrap_or_default()))
            })
            .collect(),
        Value::Sequence(items) => items
            .iter()
            .filter_map(scalar_to_string)
            .map(|item| match item.split_once('=') {
                Some((k, v)) => (k.to_string(), v.to_string()),
                None => (item, String::new()),
            })
            .collect(),
        _ => BTreeMap::new(),
    }
}

fn parse_ports(value: &Value) -> Vec<String> {
    match value {
        Value::Sequence(items) => items.iter().filter_map(scalar_to_string).collect(),
        other => scalar_to_string(other).into_iter().collect(),
    }
}

/// Render a YAML scalar as a string; `None` for null and collections
pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        _ => None,
    }
}
