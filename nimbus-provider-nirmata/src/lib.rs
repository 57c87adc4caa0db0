//! Nimbus Nirmata Provider
//!
//! Binds the `eks_cluster_type` resource to the Nirmata clusters service.
//!
//! ## Module Structure
//!
//! - `client` - `ClustersApi` seam and its HTTP implementation
//! - `config` - Typed extraction of resource attributes
//! - `document` - ClusterType document assembly
//! - `model` - Wire types of the clusters service
//! - `provider` - NirmataProvider implementation
//! - `schemas` - Resource schemas and validators
//! - `txn` - Transaction payloads and result extraction

pub mod client;
pub mod config;
pub mod document;
pub mod error;
pub mod model;
pub mod provider;
pub mod schemas;
pub mod txn;

use std::time::Duration;

// Re-export main types
pub use client::{ClientConfig, ClustersApi, ObjectId, RestClient};
pub use error::{ApiError, ClusterTypeError};
pub use provider::NirmataProvider;

use nimbus_core::provider::{BoxFuture, Provider, ProviderResult, ResourceType};
use nimbus_core::resource::{Resource, ResourceId, State};
use nimbus_core::schema::ResourceSchema;

use schemas::eks_cluster_type;

impl NirmataProvider {
    /// Create a provider talking to the clusters service over HTTP
    pub fn connect(config: ClientConfig) -> Result<Self, ApiError> {
        Ok(Self::new(RestClient::new(config)?))
    }
}

pub struct EksClusterTypeType;

impl ResourceType for EksClusterTypeType {
    fn name(&self) -> &'static str {
        eks_cluster_type::RESOURCE_TYPE
    }

    fn schema(&self) -> ResourceSchema {
        eks_cluster_type::schema()
    }

    fn create_timeout(&self) -> Option<Duration> {
        Some(eks_cluster_type::CREATE_TIMEOUT)
    }
}

/// Returns all resource types supported by this provider
pub fn resource_types() -> Vec<Box<dyn ResourceType>> {
    vec![Box::new(EksClusterTypeType)]
}

// =============================================================================
// Provider Trait Implementation
// =============================================================================

impl Provider for NirmataProvider {
    fn name(&self) -> &'static str {
        "nirmata"
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        resource_types()
    }

    fn read(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.map(|s| s.to_string());
        Box::pin(async move { self.read_resource(id, identifier.as_deref()).await })
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move { self.create_resource(resource).await })
    }

    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        _from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        let to = to.clone();
        Box::pin(async move { self.update_resource(id, &identifier, to).await })
    }

    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(async move { self.delete_resource(&id, &identifier).await })
    }
}
