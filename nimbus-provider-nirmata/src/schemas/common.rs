//! Blocks and types shared by cluster type schemas

use regex::Regex;
use std::sync::LazyLock;

use nimbus_core::resource::Value;
use nimbus_core::schema::{AttributeSchema, AttributeType, BlockSchema, types};

static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").expect("name pattern is a valid regex")
});

const MAX_NAME_LEN: usize = 63;

/// Validate an object name: lowercase alphanumerics and '-', starting and
/// ending with an alphanumeric, at most 63 characters
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.len() > MAX_NAME_LEN {
        return Err(format!(
            "name '{}' is {} characters long, at most {} allowed",
            name,
            name.len(),
            MAX_NAME_LEN
        ));
    }
    if !NAME_PATTERN.is_match(name) {
        return Err(format!(
            "name '{}' must consist of lowercase alphanumeric characters or '-', \
             and must start and end with an alphanumeric character",
            name
        ));
    }
    Ok(())
}

/// Object name type
pub fn name() -> AttributeType {
    AttributeType::Custom {
        name: "Name".to_string(),
        base: Box::new(AttributeType::String),
        validate: |value| match value {
            Value::String(s) => validate_name(s),
            _ => Err("Expected string".to_string()),
        },
    }
}

/// Add-on block
pub fn addon_block() -> BlockSchema {
    BlockSchema::new()
        .attribute(AttributeSchema::new("name", AttributeType::String).required())
        .attribute(AttributeSchema::new("addon_selector", AttributeType::String).required())
        .attribute(AttributeSchema::new("catalog", AttributeType::String).required())
        .attribute(AttributeSchema::new("channel", AttributeType::String))
        .attribute(AttributeSchema::new("sequence_number", AttributeType::Int))
        .attribute(AttributeSchema::new("allow_override", AttributeType::Bool))
}

/// Vault Kubernetes auth block
pub fn vault_auth_block() -> BlockSchema {
    let role = BlockSchema::new()
        .attribute(AttributeSchema::new("name", AttributeType::String).required())
        .attribute(AttributeSchema::new("service_account_name", AttributeType::String).required())
        .attribute(AttributeSchema::new("namespace", AttributeType::String).required())
        .attribute(AttributeSchema::new("policies", AttributeType::String).required());

    BlockSchema::new()
        .attribute(AttributeSchema::new("name", AttributeType::String).required())
        .attribute(AttributeSchema::new("path", AttributeType::String).required())
        .attribute(AttributeSchema::new("addon_name", AttributeType::String).required())
        .attribute(AttributeSchema::new("credentials_name", AttributeType::String).required())
        .attribute(AttributeSchema::new("delete_auth_path", AttributeType::Bool))
        .attribute(AttributeSchema::new("roles", types::block_list(role)))
}
