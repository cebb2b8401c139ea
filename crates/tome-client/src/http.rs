//! HTTP implementation of the backend operations.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;

use tome_core::config::BackendConfig;
use tome_core::types::FileMeta;

use crate::backend::{BackendHealth, DocumentBackend, IngestReceipt, QueryOutcome, QueryRequest};
use crate::error::ClientError;

/// Client for the document backend's REST API.
///
/// Holds a connection-pooling `reqwest::Client`; cloning is cheap and
/// shares the pool.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a client against the given base URL with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    /// Create a client from the backend section of the configuration.
    pub fn from_config(config: &BackendConfig) -> Result<Self, ClientError> {
        Self::new(
            config.base_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl DocumentBackend for HttpBackend {
    async fn ingest(&self, file: &FileMeta) -> Result<IngestReceipt, ClientError> {
        let bytes = tokio::fs::read(&file.path)
            .await
            .map_err(|source| ClientError::FileRead {
                path: file.path.display().to_string(),
                source,
            })?;

        let part = Part::bytes(bytes).file_name(file.name.clone());
        let form = Form::new().part("file", part);

        tracing::debug!(file = %file.name, size = file.size, "Uploading document");

        let response = self
            .client
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status(status.as_u16()));
        }

        response
            .json::<IngestReceipt>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn query(&self, question: &str) -> Result<QueryOutcome, ClientError> {
        tracing::debug!(len = question.len(), "Dispatching query");

        let response = self
            .client
            .post(self.endpoint("query"))
            .json(&QueryRequest { question })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status(status.as_u16()));
        }

        response
            .json::<QueryOutcome>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn health(&self) -> Result<BackendHealth, ClientError> {
        let response = self.client.get(self.endpoint("health")).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status(status.as_u16()));
        }

        response
            .json::<BackendHealth>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}
