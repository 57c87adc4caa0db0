//! EKS cluster type schema definition

use std::time::Duration;

use nimbus_core::resource::Value;
use nimbus_core::schema::{AttributeSchema, AttributeType, BlockSchema, ResourceSchema, types};

use super::common;

pub const RESOURCE_TYPE: &str = "eks_cluster_type";

/// Time budget for a create call
pub const CREATE_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Node disk sizes (GiB) accepted for EKS node pools
pub const ALLOWED_DISK_SIZES: &[i64] = &[
    20, 30, 40, 50, 60, 80, 100, 120, 150, 200, 250, 300, 400, 500, 1000,
];

pub fn validate_disk_size(size: i64) -> Result<(), String> {
    if ALLOWED_DISK_SIZES.contains(&size) {
        Ok(())
    } else {
        let allowed: Vec<String> = ALLOWED_DISK_SIZES.iter().map(|s| s.to_string()).collect();
        Err(format!(
            "disk_size {} is not supported, expected one of: {}",
            size,
            allowed.join(", ")
        ))
    }
}

/// EKS node disk size type
pub fn disk_size() -> AttributeType {
    AttributeType::Custom {
        name: "DiskSize".to_string(),
        base: Box::new(AttributeType::Int),
        validate: |value| match value {
            Value::Int(n) => validate_disk_size(*n),
            _ => Err("Expected integer".to_string()),
        },
    }
}

/// Node pool block
pub fn node_pool_block() -> BlockSchema {
    BlockSchema::new()
        .attribute(AttributeSchema::new("name", AttributeType::String).required())
        .attribute(AttributeSchema::new("instance_type", AttributeType::String).required())
        .attribute(AttributeSchema::new("disk_size", disk_size()).required())
        .attribute(AttributeSchema::new("security_groups", types::string_list()).required())
        .attribute(AttributeSchema::new("iam_role", AttributeType::String).required())
        .attribute(AttributeSchema::new("ssh_key_name", AttributeType::String))
        .attribute(AttributeSchema::new("ami_type", AttributeType::String))
        .attribute(AttributeSchema::new("image_id", AttributeType::String))
        .attribute(AttributeSchema::new("node_annotations", types::string_map()))
        .attribute(AttributeSchema::new("node_labels", types::string_map()))
}

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(RESOURCE_TYPE)
        .with_description("Template for provider-managed EKS clusters and their node pools")
        .attribute(AttributeSchema::new("name", common::name()).required())
        .attribute(
            AttributeSchema::new("version", AttributeType::String)
                .required()
                .with_description("Kubernetes version"),
        )
        .attribute(
            AttributeSchema::new("credentials", AttributeType::String)
                .required()
                .with_description("Name of the CloudCredentials to provision with"),
        )
        .attribute(AttributeSchema::new("region", AttributeType::String).required())
        .attribute(AttributeSchema::new("vpc_id", AttributeType::String).required())
        .attribute(AttributeSchema::new("subnet_id", types::string_list()).required())
        .attribute(AttributeSchema::new("cluster_role_arn", AttributeType::String).required())
        .attribute(AttributeSchema::new("security_groups", types::string_list()).required())
        .attribute(AttributeSchema::new("log_types", types::string_list()))
        .attribute(AttributeSchema::new("enable_private_endpoint", AttributeType::Bool))
        .attribute(AttributeSchema::new("enable_secrets_encryption", AttributeType::Bool))
        .attribute(
            AttributeSchema::new("kms_key_arn", AttributeType::String)
                .with_description("KMS key used when enable_secrets_encryption is set"),
        )
        .attribute(AttributeSchema::new("enable_identity_provider", AttributeType::Bool))
        .attribute(AttributeSchema::new("system_metadata", types::string_map()))
        .attribute(
            AttributeSchema::new("allow_override_credentials", AttributeType::Bool)
                .with_default(Value::Bool(false)),
        )
        .attribute(AttributeSchema::new("cluster_field_override", types::string_map()))
        .attribute(AttributeSchema::new(
            "addons",
            types::block_list(common::addon_block()),
        ))
        .attribute(
            AttributeSchema::new("vault_auth", types::block_list(common::vault_auth_block()))
                .with_max_items(1),
        )
        .attribute(AttributeSchema::new("nodepools", types::block_list(node_pool_block())).required())
        .attribute(AttributeSchema::new("nodepool_field_override", types::string_map()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use nimbus_core::schema::TypeError;

    fn s(v: &str) -> Value {
        Value::String(v.to_string())
    }

    fn node_pool(disk_size: i64) -> Value {
        Value::Map(HashMap::from([
            ("name".to_string(), s("workers")),
            ("instance_type".to_string(), s("m5.large")),
            ("disk_size".to_string(), Value::Int(disk_size)),
            ("security_groups".to_string(), Value::List(vec![s("sg-1")])),
            ("iam_role".to_string(), s("arn:aws:iam::123:role/node")),
        ]))
    }

    fn valid_attributes() -> HashMap<String, Value> {
        HashMap::from([
            ("name".to_string(), s("c1")),
            ("version".to_string(), s("1.29")),
            ("credentials".to_string(), s("aws-prod")),
            ("region".to_string(), s("us-west-2")),
            ("vpc_id".to_string(), s("vpc-1")),
            ("subnet_id".to_string(), Value::List(vec![s("subnet-1")])),
            ("cluster_role_arn".to_string(), s("arn:aws:iam::123:role/eks")),
            ("security_groups".to_string(), Value::List(vec![s("sg-1")])),
            ("nodepools".to_string(), Value::List(vec![node_pool(20)])),
        ])
    }

    #[test]
    fn valid_configuration_passes() {
        assert!(schema().validate(&valid_attributes()).is_ok());
    }

    #[test]
    fn bad_name_is_rejected() {
        let mut attrs = valid_attributes();
        attrs.insert("name".to_string(), s("Bad_Name"));
        let errors = schema().validate(&attrs).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("Bad_Name"));
    }

    #[test]
    fn disallowed_disk_size_is_rejected() {
        let mut attrs = valid_attributes();
        attrs.insert(
            "nodepools".to_string(),
            Value::List(vec![node_pool(20), node_pool(25)]),
        );
        let errors = schema().validate(&attrs).unwrap_err();
        assert_eq!(errors.len(), 1);
        let message = errors[0].to_string();
        assert!(message.contains("index 1"));
        assert!(message.contains("disk_size 25 is not supported"));
    }

    #[test]
    fn second_vault_auth_block_is_rejected() {
        let vault = Value::Map(HashMap::from([
            ("name".to_string(), s("vault")),
            ("path".to_string(), s("auth/c1")),
            ("addon_name".to_string(), s("vault-agent")),
            ("credentials_name".to_string(), s("vault-creds")),
        ]));

        let mut attrs = valid_attributes();
        attrs.insert("vault_auth".to_string(), Value::List(vec![vault.clone()]));
        assert!(schema().validate(&attrs).is_ok());

        attrs.insert("vault_auth".to_string(), Value::List(vec![vault.clone(), vault]));
        let errors = schema().validate(&attrs).unwrap_err();
        assert!(matches!(
            &errors[0],
            TypeError::TooManyItems { name, max: 1, got: 2 } if name == "vault_auth"
        ));
    }

    #[test]
    fn other_fields_are_only_type_checked() {
        let mut attrs = valid_attributes();
        attrs.insert("version".to_string(), s("not-a-version"));
        attrs.insert("kms_key_arn".to_string(), s("anything"));
        attrs.insert("log_types".to_string(), Value::List(vec![s("whatever")]));
        assert!(schema().validate(&attrs).is_ok());

        attrs.insert("enable_private_endpoint".to_string(), s("yes"));
        assert!(schema().validate(&attrs).is_err());
    }

    #[test]
    fn missing_nodepools_is_reported() {
        let mut attrs = valid_attributes();
        attrs.remove("nodepools");
        let errors = schema().validate(&attrs).unwrap_err();
        assert!(matches!(
            &errors[0],
            TypeError::MissingRequired { name } if name == "nodepools"
        ));
    }
}
