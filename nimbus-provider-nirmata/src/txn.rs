//! Transaction payloads and results of the clusters service `txn` endpoint

use serde::Serialize;

use crate::error::ClusterTypeError;
use crate::model::CreatedObject;

pub const TXN_PATH: &str = "txn";

/// Batch of operations applied atomically by the backend
#[derive(Debug, Clone, Default, Serialize)]
pub struct Transaction<T> {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub create: Vec<T>,
}

impl<T: Serialize> Transaction<T> {
    pub fn create(object: T) -> Self {
        Self {
            create: vec![object],
        }
    }
}

/// Find the object of kind `model` reported as created in a transaction result
pub fn extract_created(
    result: &serde_json::Value,
    model: &str,
) -> Result<CreatedObject, ClusterTypeError> {
    let extraction_error = |reason: String| ClusterTypeError::Extraction {
        model: model.to_string(),
        reason,
    };

    let created = result
        .get("created")
        .and_then(|v| v.as_array())
        .ok_or_else(|| extraction_error("result has no 'created' list".to_string()))?;

    let object = created
        .iter()
        .find(|obj| obj.get("modelIndex").and_then(|m| m.as_str()) == Some(model))
        .ok_or_else(|| {
            extraction_error(format!(
                "none of the {} created object(s) is a {}",
                created.len(),
                model
            ))
        })?;

    serde_json::from_value(object.clone())
        .map_err(|e| extraction_error(format!("malformed {} object: {}", model, e)))
}
