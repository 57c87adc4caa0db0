//! Local file backend for state storage
//!
//! This backend stores state in a local JSON file (default: nimbus.state.json).

use async_trait::async_trait;
use std::path::PathBuf;

use crate::backend::{BackendError, BackendResult, StateBackend};
use crate::state::StateFile;

/// Local file backend
pub struct LocalBackend {
    state_path: PathBuf,
}

impl LocalBackend {
    /// Default state file name
    pub const DEFAULT_STATE_FILE: &'static str = "nimbus.state.json";

    /// Create a new LocalBackend with a specific state file path
    pub fn with_path(state_path: PathBuf) -> Self {
        Self { state_path }
    }

    async fn load(&self) -> BackendResult<Option<StateFile>> {
        let content = match tokio::fs::read_to_string(&self.state_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(BackendError::Io(format!("Failed to read state file: {}", e)));
            }
        };

        let state: StateFile = serde_json::from_str(&content).map_err(|e| {
            BackendError::InvalidState(format!("Failed to parse state file: {}", e))
        })?;

        Ok(Some(state))
    }
}

#[async_trait]
impl StateBackend for LocalBackend {
    async fn read_state(&self) -> BackendResult<Option<StateFile>> {
        self.load().await
    }

    async fn write_state(&self, state: &StateFile) -> BackendResult<()> {
        if let Some(existing) = self.load().await?
            && existing.lineage != state.lineage
        {
            return Err(BackendError::LineageMismatch {
                expected: existing.lineage,
                actual: state.lineage.clone(),
            });
        }

        let content = serde_json::to_string_pretty(state).map_err(|e| {
            BackendError::Serialization(format!("Failed to serialize state: {}", e))
        })?;

        tokio::fs::write(&self.state_path, content)
            .await
            .map_err(|e| BackendError::Io(format!("Failed to write state file: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ResourceState;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_local_backend_read_write() {
        let dir = tempdir().unwrap();
        let backend = LocalBackend::with_path(dir.path().join("test.state.json"));

        // Initially no state
        assert!(backend.read_state().await.unwrap().is_none());

        let mut state_file = StateFile::new();
        state_file.upsert_resource(ResourceState::new(
            "eks_cluster_type",
            "main",
            "nirmata",
            "ct-1",
        ));
        state_file.increment_serial();
        backend.write_state(&state_file).await.unwrap();

        let read_state = backend.read_state().await.unwrap().unwrap();
        assert_eq!(read_state.serial, 1);
        assert_eq!(read_state.identifier("eks_cluster_type", "main"), Some("ct-1"));
    }

    #[tokio::test]
    async fn test_local_backend_rejects_foreign_lineage() {
        let dir = tempdir().unwrap();
        let backend = LocalBackend::with_path(dir.path().join("test.state.json"));

        backend.write_state(&StateFile::new()).await.unwrap();

        let result = backend.write_state(&StateFile::new()).await;
        assert!(matches!(result, Err(BackendError::LineageMismatch { .. })));
    }

    #[tokio::test]
    async fn test_local_backend_invalid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.state.json");
        std::fs::write(&path, "not json").unwrap();

        let backend = LocalBackend::with_path(path);
        let result = backend.read_state().await;
        assert!(matches!(result, Err(BackendError::InvalidState(_))));
    }
}
