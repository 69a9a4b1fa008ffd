use thiserror::Error;

pub type InsightResult<T> = Result<T, InsightError>;

/// Failure of an insight request.
///
/// Rate limiting and quota exhaustion are split out from generic upstream
/// failures so callers can word their messages differently.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InsightError {
    #[error("insight service is rate limiting requests; try again in a few minutes")]
    RateLimited,

    #[error("insight service quota exhausted")]
    QuotaExhausted,

    /// Any other failure: transport error (`status: None`) or non-success status.
    #[error("insight service error{}: {message}", status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    UpstreamError { status: Option<u16>, message: String },

    /// The service answered successfully but with no usable text.
    #[error("insight service returned no text")]
    EmptyResponse,
}

impl InsightError {
    pub fn upstream(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::UpstreamError {
            status,
            message: message.into(),
        }
    }

    /// True for failures worth retrying later without changing the request.
    pub fn is_transient(&self) -> bool {
        match self {
            InsightError::RateLimited => true,
            InsightError::UpstreamError { status, .. } => {
                status.is_none_or(|s| s >= 500)
            }
            InsightError::QuotaExhausted | InsightError::EmptyResponse => false,
        }
    }
}
