//! Nirmata Provider implementation
//!
//! This module holds the resource operations run against the clusters
//! service. Create resolves credentials, assembles the ClusterType document
//! and submits it in one transaction. Read and update leave the backend
//! untouched; the configuration held by the host is taken as authoritative.

use nimbus_core::provider::{ProviderError, ProviderResult};
use nimbus_core::resource::{Resource, ResourceId, State};

use crate::client::{ClustersApi, SERVICE_CLUSTERS};
use crate::config::EksClusterTypeConfig;
use crate::document::build_cluster_type;
use crate::error::ClusterTypeError;
use crate::model::ClusterType;
use crate::schemas::eks_cluster_type;
use crate::txn::{TXN_PATH, Transaction, extract_created};

const CLOUD_CREDENTIALS_MODEL: &str = "CloudCredentials";

/// Nirmata clusters service Provider
pub struct NirmataProvider {
    api: Box<dyn ClustersApi>,
}

impl NirmataProvider {
    pub fn new(api: impl ClustersApi + 'static) -> Self {
        Self { api: Box::new(api) }
    }

    fn check_resource_type(id: &ResourceId) -> ProviderResult<()> {
        if id.resource_type == eks_cluster_type::RESOURCE_TYPE {
            Ok(())
        } else {
            Err(
                ProviderError::new(format!("Unknown resource type: {}", id.resource_type))
                    .for_resource(id.clone()),
            )
        }
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    /// Read a resource
    ///
    /// No backend call is made; a known identifier is reported back as existing.
    pub async fn read_resource(
        &self,
        id: ResourceId,
        identifier: Option<&str>,
    ) -> ProviderResult<State> {
        Self::check_resource_type(&id)?;

        Ok(match identifier {
            Some(identifier) => State::existing(id, Default::default()).with_identifier(identifier),
            None => State::not_found(id),
        })
    }

    /// Create a resource and return its state carrying the new identifier
    pub async fn create_resource(&self, resource: Resource) -> ProviderResult<State> {
        Self::check_resource_type(&resource.id)?;

        let mut attributes = resource.attributes;
        eks_cluster_type::schema().apply_defaults(&mut attributes);

        let config = EksClusterTypeConfig::from_attributes(&attributes)
            .map_err(|e| ProviderError::from(e).for_resource(resource.id.clone()))?;

        let identifier = self
            .create_eks_cluster_type(&config)
            .await
            .map_err(|e| ProviderError::from(e).for_resource(resource.id.clone()))?;

        log::info!("created {} {} as {}", ClusterType::MODEL, resource.id, identifier);
        Ok(State::existing(resource.id, attributes).with_identifier(identifier))
    }

    /// Update a resource
    ///
    /// Nothing is sent to the backend; the identifier is kept as is.
    pub async fn update_resource(
        &self,
        id: ResourceId,
        identifier: &str,
        to: Resource,
    ) -> ProviderResult<State> {
        Self::check_resource_type(&id)?;
        Ok(State::existing(id, to.attributes).with_identifier(identifier))
    }

    /// Delete a resource
    pub async fn delete_resource(&self, id: &ResourceId, identifier: &str) -> ProviderResult<()> {
        Self::check_resource_type(id)?;

        self.delete_object(ClusterType::MODEL, identifier)
            .await
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;

        log::info!("deleted {} {} ({})", ClusterType::MODEL, id, identifier);
        Ok(())
    }

    // =========================================================================
    // Clusters Service Calls
    // =========================================================================

    /// Submit a ClusterType for `config` and return the backend-assigned id
    pub async fn create_eks_cluster_type(
        &self,
        config: &EksClusterTypeConfig,
    ) -> Result<String, ClusterTypeError> {
        let credentials = self
            .api
            .query_by_name(SERVICE_CLUSTERS, CLOUD_CREDENTIALS_MODEL, &config.credentials)
            .await
            .map_err(|source| {
                log::error!("failed to look up credentials '{}': {}", config.credentials, source);
                ClusterTypeError::Lookup {
                    name: config.credentials.clone(),
                    source,
                }
            })?;

        let cluster_type = build_cluster_type(config, &credentials);
        log::debug!(
            "submitting {} '{}' with {} node pool(s)",
            ClusterType::MODEL,
            cluster_type.name,
            cluster_type.spec.cloud_config_spec.node_pool_types.len()
        );

        let txn = serde_json::to_value(Transaction::create(cluster_type)).map_err(|e| {
            ClusterTypeError::InvalidConfig(format!("failed to encode cluster type: {}", e))
        })?;

        let result = self
            .api
            .post_from_json(SERVICE_CLUSTERS, TXN_PATH, &txn)
            .await
            .map_err(|e| {
                log::error!("failed to create cluster type '{}': {}", config.name, e);
                ClusterTypeError::Submission(e)
            })?;

        let created = extract_created(&result, ClusterType::MODEL).inspect_err(|e| {
            log::error!("cluster type '{}': {}", config.name, e);
        })?;

        Ok(created.id)
    }

    /// Delete a clusters service object by kind and id
    pub async fn delete_object(&self, model: &str, id: &str) -> Result<(), ClusterTypeError> {
        self.api
            .delete_obj(SERVICE_CLUSTERS, model, id)
            .await
            .map_err(|source| {
                log::error!("failed to delete {} {}: {}", model, id, source);
                ClusterTypeError::Delete {
                    model: model.to_string(),
                    id: id.to_string(),
                    source,
                }
            })
    }
}
