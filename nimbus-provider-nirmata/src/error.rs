//! Error types for the clusters API and the cluster-type binding

use nimbus_core::provider::ProviderError;
use thiserror::Error;

/// Errors surfaced by a `ClustersApi` implementation
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be sent or its body could not be read
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// A name lookup matched no object
    #[error("{model} '{name}' not found")]
    NotFound { model: String, name: String },

    /// The configured base URL cannot address an API path
    #[error("invalid URL '{0}'")]
    InvalidUrl(String),

    /// The response body did not have the expected shape
    #[error("invalid response: {0}")]
    Decode(String),
}

/// Errors raised while creating or deleting a cluster type
#[derive(Debug, Error)]
pub enum ClusterTypeError {
    /// The named cloud credentials could not be resolved; nothing was submitted
    #[error("failed to resolve credentials '{name}': {source}")]
    Lookup {
        name: String,
        #[source]
        source: ApiError,
    },

    /// The transaction was rejected or never reached the backend
    #[error("failed to create cluster type: {0}")]
    Submission(#[source] ApiError),

    /// The transaction went through but the created object could not be found
    /// in its result. The backend may hold an object this resource does not track.
    #[error("transaction result has no created {model}: {reason}")]
    Extraction { model: String, reason: String },

    /// Attribute values could not be read into a cluster type configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Deleting the backend object failed
    #[error("failed to delete {model} {id}: {source}")]
    Delete {
        model: String,
        id: String,
        #[source]
        source: ApiError,
    },
}

impl From<ClusterTypeError> for ProviderError {
    fn from(err: ClusterTypeError) -> Self {
        ProviderError::new(err.to_string()).with_cause(err)
    }
}
