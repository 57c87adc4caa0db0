//! State file structures for persisting resource identifiers

use serde::{Deserialize, Serialize};

/// The main state file structure that persists to the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateFile {
    /// State file format version
    pub version: u32,
    /// Monotonically increasing number for each state modification
    pub serial: u64,
    /// Unique identifier for this state lineage (prevents accidental overwrites)
    pub lineage: String,
    /// Version of nimbus that last modified this state
    pub nimbus_version: String,
    /// All managed resources
    pub resources: Vec<ResourceState>,
}

impl StateFile {
    /// Current state file format version
    pub const CURRENT_VERSION: u32 = 1;

    /// Create a new empty state file
    pub fn new() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            serial: 0,
            lineage: uuid::Uuid::new_v4().to_string(),
            nimbus_version: env!("CARGO_PKG_VERSION").to_string(),
            resources: Vec::new(),
        }
    }

    /// Increment serial and update nimbus version for a new state write
    pub fn increment_serial(&mut self) {
        self.serial += 1;
        self.nimbus_version = env!("CARGO_PKG_VERSION").to_string();
    }

    /// Find a resource by type and name
    pub fn find_resource(&self, resource_type: &str, name: &str) -> Option<&ResourceState> {
        self.resources
            .iter()
            .find(|r| r.resource_type == resource_type && r.name == name)
    }

    /// Identifier recorded for a resource, if any
    pub fn identifier(&self, resource_type: &str, name: &str) -> Option<&str> {
        self.find_resource(resource_type, name)
            .map(|r| r.identifier.as_str())
    }

    /// Add or update a resource in the state
    pub fn upsert_resource(&mut self, resource: ResourceState) {
        match self
            .resources
            .iter_mut()
            .find(|r| r.resource_type == resource.resource_type && r.name == resource.name)
        {
            Some(existing) => *existing = resource,
            None => self.resources.push(resource),
        }
    }

    /// Remove a resource from the state
    pub fn remove_resource(&mut self, resource_type: &str, name: &str) -> Option<ResourceState> {
        let pos = self
            .resources
            .iter()
            .position(|r| r.resource_type == resource_type && r.name == name)?;
        Some(self.resources.remove(pos))
    }
}

impl Default for StateFile {
    fn default() -> Self {
        Self::new()
    }
}

/// State of a single managed resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceState {
    /// Resource type (e.g., "eks_cluster_type")
    pub resource_type: String,
    /// Local resource name from the configuration
    pub name: String,
    /// Provider name (e.g., "nirmata")
    pub provider: String,
    /// Backend-assigned identifier
    pub identifier: String,
}

impl ResourceState {
    pub fn new(
        resource_type: impl Into<String>,
        name: impl Into<String>,
        provider: impl Into<String>,
        identifier: impl Into<String>,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
            provider: provider.into(),
            identifier: identifier.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_file() {
        let state = StateFile::new();
        assert_eq!(state.version, StateFile::CURRENT_VERSION);
        assert_eq!(state.serial, 0);
        assert!(!state.lineage.is_empty());
        assert!(state.resources.is_empty());
    }

    #[test]
    fn test_upsert_replaces_identifier() {
        let mut state = StateFile::new();
        state.upsert_resource(ResourceState::new("eks_cluster_type", "main", "nirmata", "ct-1"));
        state.upsert_resource(ResourceState::new("eks_cluster_type", "main", "nirmata", "ct-2"));

        assert_eq!(state.resources.len(), 1);
        assert_eq!(state.identifier("eks_cluster_type", "main"), Some("ct-2"));
    }

    #[test]
    fn test_remove_resource() {
        let mut state = StateFile::new();
        state.upsert_resource(ResourceState::new("eks_cluster_type", "main", "nirmata", "ct-1"));

        let removed = state.remove_resource("eks_cluster_type", "main");
        assert_eq!(removed.map(|r| r.identifier), Some("ct-1".to_string()));
        assert!(state.resources.is_empty());

        // Removing non-existent resource returns None
        assert!(state.remove_resource("eks_cluster_type", "other").is_none());
    }

    #[test]
    fn test_state_file_serialization() {
        let mut state = StateFile::new();
        state.upsert_resource(ResourceState::new("eks_cluster_type", "main", "nirmata", "ct-1"));

        let json = serde_json::to_string_pretty(&state).unwrap();
        let deserialized: StateFile = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.lineage, state.lineage);
        assert_eq!(deserialized.resources, state.resources);
    }
}
