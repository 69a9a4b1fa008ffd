//! Insight client: snapshot in, advisory text out.

use harvest_inventory::InventorySnapshot;
use tracing::{Span, info, instrument, warn};

use crate::config::InsightConfig;
use crate::request::{ErrorBody, GenerationRequest, GenerationResponse, InsightPayload, build_prompt};
use crate::result::{InsightError, InsightResult};
use crate::transport::{GenerationTransport, HttpGenerationTransport, TransportResponse};

/// Longest upstream body excerpt kept in an error message.
const MAX_ERROR_EXCERPT: usize = 512;

/// Stateless insight client.
///
/// Each call serializes the whole snapshot; nothing is cached or retried.
#[derive(Debug, Clone)]
pub struct InsightClient<T> {
    transport: T,
}

impl InsightClient<HttpGenerationTransport> {
    pub fn from_config(config: &InsightConfig) -> InsightResult<Self> {
        Ok(Self::new(HttpGenerationTransport::new(config)?))
    }
}

impl<T> InsightClient<T>
where
    T: GenerationTransport,
{
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Ask the generation service for advice on `snapshot`.
    ///
    /// An empty inventory is still sent as a well-formed request.
    #[instrument(
        skip_all,
        fields(items = snapshot.items.len(), status = tracing::field::Empty),
        err
    )]
    pub async fn request_insight(&self, snapshot: &InventorySnapshot) -> InsightResult<String> {
        let payload = InsightPayload::from_snapshot(snapshot);
        let request = GenerationRequest::new(build_prompt(&payload)?);

        let response = self.transport.send(&request).await?;
        Span::current().record("status", response.status);

        let text = classify(response)?;
        info!(chars = text.len(), "insight received");
        Ok(text)
    }
}

/// Map a raw response to advisory text or a typed failure.
pub fn classify(response: TransportResponse) -> InsightResult<String> {
    let TransportResponse { status, body } = response;

    if (200..300).contains(&status) {
        let parsed: GenerationResponse = serde_json::from_str(&body).map_err(|e| {
            InsightError::upstream(Some(status), format!("malformed response body: {e}"))
        })?;
        return parsed.first_text().ok_or(InsightError::EmptyResponse);
    }

    if status == 402 || is_quota_exhausted(&body) {
        warn!(status, "insight quota exhausted");
        return Err(InsightError::QuotaExhausted);
    }
    if status == 429 {
        warn!(status, "insight rate limited");
        return Err(InsightError::RateLimited);
    }

    Err(InsightError::upstream(Some(status), error_message(&body)))
}

fn parse_error_body(body: &str) -> Option<ErrorBody> {
    serde_json::from_str::<ErrorBody>(body).ok()
}

fn is_quota_exhausted(body: &str) -> bool {
    parse_error_body(body).is_some_and(|b| {
        b.error.status == "RESOURCE_EXHAUSTED" && b.error.message.to_lowercase().contains("quota")
    })
}

fn error_message(body: &str) -> String {
    if let Some(parsed) = parse_error_body(body).filter(|b| !b.error.message.is_empty()) {
        return parsed.error.message;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }
    trimmed.chars().take(MAX_ERROR_EXCERPT).collect()
}
