//! Assembly of the ClusterType document submitted to the backend

use crate::client::ObjectId;
use crate::config::{AddonConfig, EksClusterTypeConfig, NodePoolConfig, VaultAuthConfig};
use crate::model::{
    AddOnSpec, CloudConfigSpec, ClusterSpec, ClusterType, EksConfig, FieldsToOverride,
    NodePoolEksConfig, NodePoolSpec, NodePoolType, VaultAuthSpec, VaultRole,
};

const CLOUD_AWS: &str = "aws";
const MODE_PROVIDER_MANAGED: &str = "providerManaged";

/// Name of the node pool at `index` of a cluster type
pub fn node_pool_name(cluster_name: &str, index: usize) -> String {
    format!("{}-node-pool-{}", cluster_name, index)
}

/// Build the ClusterType for `config`, referencing the resolved credentials
pub fn build_cluster_type(config: &EksClusterTypeConfig, credentials: &ObjectId) -> ClusterType {
    let node_pool_types = config
        .nodepools
        .iter()
        .map(|pool| build_node_pool(&config.name, pool))
        .collect();

    ClusterType {
        name: config.name.clone(),
        description: String::new(),
        spec: ClusterSpec {
            cluster_mode: MODE_PROVIDER_MANAGED.to_string(),
            version: config.version.clone(),
            cloud: CLOUD_AWS.to_string(),
            system_metadata: config.system_metadata.clone(),
            addons: config.addons.iter().map(build_addon).collect(),
            vault: config.vault_auth.as_ref().map(build_vault_auth),
            cloud_config_spec: CloudConfigSpec {
                credentials: credentials.to_string(),
                allow_override_credentials: config.allow_override_credentials,
                fields_to_override: FieldsToOverride {
                    cluster: config.cluster_field_override.clone(),
                    node_pool: config.nodepool_field_override.clone(),
                },
                eks_config: EksConfig {
                    region: config.region.clone(),
                    vpc_id: config.vpc_id.clone(),
                    subnet_id: config.subnet_id.clone(),
                    cluster_role_arn: config.cluster_role_arn.clone(),
                    security_groups: config.security_groups.clone(),
                    log_types: config.log_types.clone(),
                    private_endpoint_access: config.enable_private_endpoint,
                    enable_identity_provider: config.enable_identity_provider,
                    enable_secrets_encryption: config.enable_secrets_encryption,
                    key_arn: config.kms_key_arn.clone(),
                },
                node_pool_types,
            },
        },
    }
}

fn build_node_pool(cluster_name: &str, pool: &NodePoolConfig) -> NodePoolType {
    NodePoolType {
        name: node_pool_name(cluster_name, pool.index),
        spec: NodePoolSpec {
            node_labels: pool.node_labels.clone(),
            node_annotations: pool.node_annotations.clone(),
            eks_config: NodePoolEksConfig {
                instance_type: pool.instance_type.clone(),
                disk_size: pool.disk_size,
                security_groups: pool.security_groups.clone(),
                node_iam_role: pool.iam_role.clone(),
                key_name: pool.ssh_key_name.clone(),
                ami_type: pool.ami_type.clone(),
                image_id: pool.image_id.clone(),
            },
        },
    }
}

fn build_addon(addon: &AddonConfig) -> AddOnSpec {
    AddOnSpec {
        name: addon.name.clone(),
        add_on_selector: addon.addon_selector.clone(),
        catalog: addon.catalog.clone(),
        channel: addon.channel.clone(),
        sequence_number: addon.sequence_number,
        allow_override: addon.allow_override,
    }
}

fn build_vault_auth(vault: &VaultAuthConfig) -> VaultAuthSpec {
    VaultAuthSpec {
        name: vault.name.clone(),
        path: vault.path.clone(),
        addon_name: vault.addon_name.clone(),
        credentials_name: vault.credentials_name.clone(),
        delete_auth_path: vault.delete_auth_path,
        roles: vault
            .roles
            .iter()
            .map(|role| VaultRole {
                name: role.name.clone(),
                service_account_name: role.service_account_name.clone(),
                namespace: role.namespace.clone(),
                policies: role.policies.clone(),
            })
            .collect(),
    }
}
