use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// Caller bug: bad timeframe, unknown ratio name, empty exercise id.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Record store unavailable: {0}")]
    DataUnavailable(String),
    #[error("Analyzer '{analyzer}' timed out after {timeout_ms}ms")]
    Timeout { analyzer: &'static str, timeout_ms: u64 },
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AnalyticsError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        AnalyticsError::InvalidArgument(message.into())
    }

    /// A failed record store read, tagged with the analyzer that issued it
    pub fn data_unavailable(analyzer: &str, source: &anyhow::Error) -> Self {
        AnalyticsError::DataUnavailable(format!("{}: {:#}", analyzer, source))
    }

    fn code(&self) -> &'static str {
        match self {
            AnalyticsError::InvalidArgument(_) => "invalid_argument",
            AnalyticsError::DataUnavailable(_) => "data_unavailable",
            AnalyticsError::Timeout { .. } => "timeout",
            AnalyticsError::Config(_) => "config",
        }
    }
}

impl IntoResponse for AnalyticsError {
    fn into_response(self) -> Response {
        let status = match self {
            AnalyticsError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            AnalyticsError::DataUnavailable(_) | AnalyticsError::Timeout { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AnalyticsError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.code(),
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

pub type AnalyticsResult<T> = Result<T, AnalyticsError>;
