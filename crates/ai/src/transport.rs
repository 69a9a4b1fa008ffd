//! Transport seam between the insight client and the generation service.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::InsightConfig;
use crate::request::GenerationRequest;
use crate::result::{InsightError, InsightResult};

/// Raw HTTP outcome; classification happens in the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Sends one generation request.
///
/// Only network-level failures are errors here; any HTTP status is a response.
#[async_trait]
pub trait GenerationTransport: Send + Sync {
    async fn send(&self, request: &GenerationRequest) -> InsightResult<TransportResponse>;
}

#[async_trait]
impl<T> GenerationTransport for Arc<T>
where
    T: GenerationTransport + ?Sized,
{
    async fn send(&self, request: &GenerationRequest) -> InsightResult<TransportResponse> {
        (**self).send(request).await
    }
}

/// `reqwest`-backed transport for the `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct HttpGenerationTransport {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpGenerationTransport {
    pub fn new(config: &InsightConfig) -> InsightResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| InsightError::upstream(None, format!("failed to build http client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl GenerationTransport for HttpGenerationTransport {
    async fn send(&self, request: &GenerationRequest) -> InsightResult<TransportResponse> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| InsightError::upstream(None, e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| InsightError::upstream(Some(status), format!("failed to read body: {e}")))?;

        Ok(TransportResponse { status, body })
    }
}
