//! Typed view of an `eks_cluster_type` configuration
//!
//! Attribute values arrive as loosely typed [`Value`]s. Extraction reads them
//! into plain structs, using the zero value for anything optional and unset.

use std::collections::HashMap;

use nimbus_core::resource::Value;

use crate::error::ClusterTypeError;
use crate::model::StringMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EksClusterTypeConfig {
    pub name: String,
    pub version: String,
    /// CloudCredentials name, resolved to an id at create time
    pub credentials: String,
    pub region: String,
    pub vpc_id: String,
    pub subnet_id: Vec<String>,
    pub cluster_role_arn: String,
    pub security_groups: Vec<String>,
    pub log_types: Vec<String>,
    pub enable_private_endpoint: bool,
    pub enable_secrets_encryption: bool,
    pub kms_key_arn: String,
    pub enable_identity_provider: bool,
    pub system_metadata: StringMap,
    pub allow_override_credentials: bool,
    pub cluster_field_override: StringMap,
    pub nodepool_field_override: StringMap,
    pub addons: Vec<AddonConfig>,
    pub vault_auth: Option<VaultAuthConfig>,
    pub nodepools: Vec<NodePoolConfig>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePoolConfig {
    /// Position of the entry in the input list
    pub index: usize,
    pub name: String,
    pub instance_type: String,
    pub disk_size: i64,
    pub security_groups: Vec<String>,
    pub iam_role: String,
    pub ssh_key_name: String,
    pub ami_type: String,
    pub image_id: String,
    pub node_labels: StringMap,
    pub node_annotations: StringMap,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddonConfig {
    pub name: String,
    pub addon_selector: String,
    pub catalog: String,
    pub channel: String,
    pub sequence_number: i64,
    pub allow_override: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VaultAuthConfig {
    pub name: String,
    pub path: String,
    pub addon_name: String,
    pub credentials_name: String,
    pub delete_auth_path: bool,
    pub roles: Vec<VaultRoleConfig>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VaultRoleConfig {
    pub name: String,
    pub service_account_name: String,
    pub namespace: String,
    pub policies: String,
}

impl EksClusterTypeConfig {
    pub fn from_attributes(attrs: &HashMap<String, Value>) -> Result<Self, ClusterTypeError> {
        Ok(Self {
            name: required_string(attrs, "name")?,
            version: required_string(attrs, "version")?,
            credentials: required_string(attrs, "credentials")?,
            region: required_string(attrs, "region")?,
            vpc_id: required_string(attrs, "vpc_id")?,
            subnet_id: string_list(attrs, "subnet_id"),
            cluster_role_arn: required_string(attrs, "cluster_role_arn")?,
            security_groups: string_list(attrs, "security_groups"),
            log_types: string_list(attrs, "log_types"),
            enable_private_endpoint: bool_or_default(attrs, "enable_private_endpoint"),
            enable_secrets_encryption: bool_or_default(attrs, "enable_secrets_encryption"),
            kms_key_arn: string_or_default(attrs, "kms_key_arn"),
            enable_identity_provider: bool_or_default(attrs, "enable_identity_provider"),
            system_metadata: string_map(attrs, "system_metadata"),
            allow_override_credentials: bool_or_default(attrs, "allow_override_credentials"),
            cluster_field_override: string_map(attrs, "cluster_field_override"),
            nodepool_field_override: string_map(attrs, "nodepool_field_override"),
            addons: blocks(attrs, "addons").map(AddonConfig::from_block).collect(),
            vault_auth: blocks(attrs, "vault_auth")
                .next()
                .map(VaultAuthConfig::from_block),
            nodepools: node_pools(attrs),
        })
    }
}

/// Node pool entries in input order.
///
/// An entry that is not a block is skipped without error. Kept entries
/// retain their input position, so a skipped entry still consumes an index.
fn node_pools(attrs: &HashMap<String, Value>) -> Vec<NodePoolConfig> {
    let Some(entries) = attrs.get("nodepools").and_then(Value::as_list) else {
        return Vec::new();
    };

    entries
        .iter()
        .enumerate()
        .filter_map(|(i, entry)| match entry.as_map() {
            Some(block) => Some(NodePoolConfig::from_block(i, block)),
            None => {
                log::debug!("skipping nodepools[{}]: not a block", i);
                None
            }
        })
        .collect()
}

impl NodePoolConfig {
    fn from_block(index: usize, block: &HashMap<String, Value>) -> Self {
        Self {
            index,
            name: string_or_default(block, "name"),
            instance_type: string_or_default(block, "instance_type"),
            disk_size: int_or_default(block, "disk_size"),
            security_groups: string_list(block, "security_groups"),
            iam_role: string_or_default(block, "iam_role"),
            ssh_key_name: string_or_default(block, "ssh_key_name"),
            ami_type: string_or_default(block, "ami_type"),
            image_id: string_or_default(block, "image_id"),
            node_labels: string_map(block, "node_labels"),
            node_annotations: string_map(block, "node_annotations"),
        }
    }
}

impl AddonConfig {
    fn from_block(block: &HashMap<String, Value>) -> Self {
        Self {
            name: string_or_default(block, "name"),
            addon_selector: string_or_default(block, "addon_selector"),
            catalog: string_or_default(block, "catalog"),
            channel: string_or_default(block, "channel"),
            sequence_number: int_or_default(block, "sequence_number"),
            allow_override: bool_or_default(block, "allow_override"),
        }
    }
}

impl VaultAuthConfig {
    fn from_block(block: &HashMap<String, Value>) -> Self {
        Self {
            name: string_or_default(block, "name"),
            path: string_or_default(block, "path"),
            addon_name: string_or_default(block, "addon_name"),
            credentials_name: string_or_default(block, "credentials_name"),
            delete_auth_path: bool_or_default(block, "delete_auth_path"),
            roles: blocks(block, "roles")
                .map(|role| VaultRoleConfig {
                    name: string_or_default(role, "name"),
                    service_account_name: string_or_default(role, "service_account_name"),
                    namespace: string_or_default(role, "namespace"),
                    policies: string_or_default(role, "policies"),
                })
                .collect(),
        }
    }
}

// =============================================================================
// Attribute Accessors
// =============================================================================
//
// These assume attributes already checked against the schema: elements of the
// wrong type inside a list or map are dropped rather than reported.

fn required_string(attrs: &HashMap<String, Value>, key: &str) -> Result<String, ClusterTypeError> {
    attrs
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ClusterTypeError::InvalidConfig(format!("'{}' must be a string", key)))
}

fn string_or_default(attrs: &HashMap<String, Value>, key: &str) -> String {
    attrs
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn int_or_default(attrs: &HashMap<String, Value>, key: &str) -> i64 {
    attrs.get(key).and_then(Value::as_int).unwrap_or_default()
}

fn bool_or_default(attrs: &HashMap<String, Value>, key: &str) -> bool {
    attrs.get(key).and_then(Value::as_bool).unwrap_or_default()
}

fn string_list(attrs: &HashMap<String, Value>, key: &str) -> Vec<String> {
    attrs
        .get(key)
        .and_then(Value::as_list)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn string_map(attrs: &HashMap<String, Value>, key: &str) -> StringMap {
    attrs
        .get(key)
        .and_then(Value::as_map)
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

fn blocks<'a>(
    attrs: &'a HashMap<String, Value>,
    key: &str,
) -> impl Iterator<Item = &'a HashMap<String, Value>> {
    attrs
        .get(key)
        .and_then(Value::as_list)
        .unwrap_or_default()
        .iter()
        .filter_map(Value::as_map)
}
