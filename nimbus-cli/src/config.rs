//! Loading resource configuration files
//!
//! A configuration file is a JSON document:
//!
//! ```json
//! {
//!   "resources": [
//!     { "type": "eks_cluster_type", "name": "main", "attributes": { "name": "c1" } }
//!   ]
//! }
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use nimbus_core::resource::{Resource, Value};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    resources: Vec<ResourceBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ResourceBlock {
    #[serde(rename = "type")]
    resource_type: String,
    name: String,
    #[serde(default)]
    attributes: serde_json::Map<String, serde_json::Value>,
}

/// Read and parse a configuration file
pub fn load_resources(path: &Path) -> Result<Vec<Resource>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    parse_resources(&content).map_err(|e| format!("{}: {}", path.display(), e))
}

/// Parse configuration content into resources, in declaration order
pub fn parse_resources(content: &str) -> Result<Vec<Resource>, String> {
    let file: ConfigFile =
        serde_json::from_str(content).map_err(|e| format!("Parse error: {}", e))?;

    let mut seen = HashSet::new();
    let mut resources = Vec::with_capacity(file.resources.len());

    for block in file.resources {
        if !seen.insert((block.resource_type.clone(), block.name.clone())) {
            return Err(format!(
                "Duplicate resource {}.{}",
                block.resource_type, block.name
            ));
        }

        let mut resource = Resource::new(block.resource_type, block.name);
        for (key, value) in &block.attributes {
            // null means "unset"
            if let Some(value) = Value::from_json(value) {
                resource.attributes.insert(key.clone(), value);
            }
        }
        resources.push(resource);
    }

    Ok(resources)
}
