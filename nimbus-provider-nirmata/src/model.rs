//! Wire model of the clusters service
//!
//! Every object carries a `modelIndex` naming its backend kind; serde writes
//! it from the struct's rename.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub type StringMap = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "modelIndex", rename = "ClusterType", rename_all = "camelCase")]
pub struct ClusterType {
    pub name: String,
    pub description: String,
    pub spec: ClusterSpec,
}

impl ClusterType {
    pub const MODEL: &'static str = "ClusterType";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "modelIndex", rename = "ClusterSpec", rename_all = "camelCase")]
pub struct ClusterSpec {
    pub cluster_mode: String,
    pub version: String,
    pub cloud: String,
    pub system_metadata: StringMap,
    pub addons: Vec<AddOnSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vault: Option<VaultAuthSpec>,
    pub cloud_config_spec: CloudConfigSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "modelIndex", rename = "CloudConfigSpec", rename_all = "camelCase")]
pub struct CloudConfigSpec {
    /// Resolved CloudCredentials id
    pub credentials: String,
    pub allow_override_credentials: bool,
    pub fields_to_override: FieldsToOverride,
    pub eks_config: EksConfig,
    pub node_pool_types: Vec<NodePoolType>,
}

/// Raw backend fields injected into the generated cluster and node pools
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldsToOverride {
    pub cluster: StringMap,
    pub node_pool: StringMap,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EksConfig {
    pub region: String,
    pub vpc_id: String,
    pub subnet_id: Vec<String>,
    pub cluster_role_arn: String,
    pub security_groups: Vec<String>,
    pub log_types: Vec<String>,
    pub private_endpoint_access: bool,
    pub enable_identity_provider: bool,
    pub enable_secrets_encryption: bool,
    pub key_arn: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "modelIndex", rename = "NodePoolType", rename_all = "camelCase")]
pub struct NodePoolType {
    pub name: String,
    pub spec: NodePoolSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "modelIndex", rename = "NodePoolSpec", rename_all = "camelCase")]
pub struct NodePoolSpec {
    pub node_labels: StringMap,
    pub node_annotations: StringMap,
    pub eks_config: NodePoolEksConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePoolEksConfig {
    pub instance_type: String,
    pub disk_size: i64,
    pub security_groups: Vec<String>,
    pub node_iam_role: String,
    pub key_name: String,
    pub ami_type: String,
    pub image_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "modelIndex", rename = "AddOnSpec", rename_all = "camelCase")]
pub struct AddOnSpec {
    pub name: String,
    pub add_on_selector: String,
    pub catalog: String,
    pub channel: String,
    pub sequence_number: i64,
    pub allow_override: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "modelIndex", rename = "VaultAuthSpec", rename_all = "camelCase")]
pub struct VaultAuthSpec {
    pub name: String,
    pub path: String,
    pub addon_name: String,
    pub credentials_name: String,
    pub delete_auth_path: bool,
    pub roles: Vec<VaultRole>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "modelIndex", rename = "VaultRole", rename_all = "camelCase")]
pub struct VaultRole {
    pub name: String,
    pub service_account_name: String,
    pub namespace: String,
    pub policies: String,
}

/// An object reported in a transaction result
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedObject {
    pub model_index: String,
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn node_pool_serializes_with_model_index() {
        let pool = NodePoolType {
            name: "c1-node-pool-0".to_string(),
            spec: NodePoolSpec {
                node_labels: StringMap::from([("tier".to_string(), "web".to_string())]),
                node_annotations: StringMap::new(),
                eks_config: NodePoolEksConfig {
                    instance_type: "m5.large".to_string(),
                    disk_size: 20,
                    ..Default::default()
                },
            },
        };

        let value = serde_json::to_value(&pool).unwrap();
        assert_eq!(value["modelIndex"], "NodePoolType");
        assert_eq!(value["spec"]["modelIndex"], "NodePoolSpec");
        assert_eq!(value["spec"]["nodeLabels"], json!({ "tier": "web" }));
        assert_eq!(value["spec"]["eksConfig"]["instanceType"], "m5.large");
        assert_eq!(value["spec"]["eksConfig"]["diskSize"], 20);
        assert_eq!(value["spec"]["eksConfig"]["keyName"], "");
    }

    #[test]
    fn created_object_ignores_extra_fields() {
        let obj: CreatedObject = serde_json::from_value(json!({
            "modelIndex": "ClusterType",
            "id": "ct-1",
            "name": "c1",
            "spec": {},
        }))
        .unwrap();
        assert_eq!(obj.model_index, "ClusterType");
        assert_eq!(obj.id, "ct-1");
    }
}
