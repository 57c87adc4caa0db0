//! Clusters service API
//!
//! The binding consumes the backend through [`ClustersApi`]: a name lookup,
//! a generic JSON POST and a delete by kind and id. [`RestClient`] is the
//! HTTP implementation used outside of tests.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;

/// Service hosting cluster types and cloud credentials
pub const SERVICE_CLUSTERS: &str = "clusters";

/// Opaque backend object identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectId(String);

impl ObjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Calls the binding makes against the backend
#[async_trait]
pub trait ClustersApi: Send + Sync {
    /// Resolve an object of kind `model` by its name
    async fn query_by_name(
        &self,
        service: &str,
        model: &str,
        name: &str,
    ) -> Result<ObjectId, ApiError>;

    /// POST a JSON body to `path` and return the decoded JSON response
    async fn post_from_json(
        &self,
        service: &str,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, ApiError>;

    /// Delete an object by kind and id
    async fn delete_obj(&self, service: &str, model: &str, id: &str) -> Result<(), ApiError>;
}

/// Connection settings for [`RestClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL, e.g. `https://nirmata.io`
    pub url: String,
    /// API token sent as `Authorization: NIRMATA-API <token>`
    pub token: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Deserialize)]
struct ObjectRef {
    id: String,
}

/// HTTP client for the clusters service
pub struct RestClient {
    config: ClientConfig,
    client: reqwest::Client,
}

impl RestClient {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    fn url(&self, service: &str, path: &str) -> String {
        format!(
            "{}/{}/api/{}",
            self.config.url.trim_end_matches('/'),
            service,
            path
        )
    }

    /// URL of a single object, with `id` percent-encoded as one path segment
    fn object_url(&self, service: &str, model: &str, id: &str) -> Result<reqwest::Url, ApiError> {
        let base = self.url(service, model);
        let mut url =
            reqwest::Url::parse(&base).map_err(|_| ApiError::InvalidUrl(base.clone()))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(base))?
            .push(id);
        Ok(url)
    }

    fn authorization(&self) -> String {
        format!("NIRMATA-API {}", self.config.token)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = request
            .header(reqwest::header::AUTHORIZATION, self.authorization())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl ClustersApi for RestClient {
    async fn query_by_name(
        &self,
        service: &str,
        model: &str,
        name: &str,
    ) -> Result<ObjectId, ApiError> {
        let query = json!({ "name": name }).to_string();
        let request = self
            .client
            .get(self.url(service, model))
            .query(&[("fields", "id,name"), ("query", query.as_str())]);

        let objects: Vec<ObjectRef> = self
            .send(request)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::Decode(format!("{} query: {}", model, e)))?;

        objects
            .into_iter()
            .next()
            .map(|obj| ObjectId::new(obj.id))
            .ok_or_else(|| ApiError::NotFound {
                model: model.to_string(),
                name: name.to_string(),
            })
    }

    async fn post_from_json(
        &self,
        service: &str,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, ApiError> {
        let request = self.client.post(self.url(service, path)).json(body);

        self.send(request)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::Decode(format!("{} response: {}", path, e)))
    }

    async fn delete_obj(&self, service: &str, model: &str, id: &str) -> Result<(), ApiError> {
        let request = self.client.delete(self.object_url(service, model, id)?);
        self.send(request).await?;
        Ok(())
    }
}
