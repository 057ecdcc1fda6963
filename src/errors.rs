use axum::http::{HeaderMap, HeaderValue};
use axum::response::IntoResponse;
use reqwest::StatusCode;
use thiserror::Error;
use uuid::Uuid;

use crate::external::price_provider::PriceProviderError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Session {0} not found")]
    SessionNotFound(Uuid),
    #[error("Rate limited by external provider")]
    RateLimited,
    #[error("External error: {0}")]
    External(String),
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
}

/// Failures of the completion client.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LlmError {
    #[error("no API key configured for this session")]
    MissingApiKey,
    #[error("request timed out")]
    Timeout,
    #[error("rate limited by completion API")]
    RateLimited,
    #[error("network error: {0}")]
    NetworkError(String),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg).into_response(),
            AppError::SessionNotFound(id) => {
                (StatusCode::NOT_FOUND, format!("Session {} not found", id)).into_response()
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AppError::Llm(LlmError::MissingApiKey) => {
                (StatusCode::BAD_REQUEST, LlmError::MissingApiKey.to_string()).into_response()
            }
            AppError::RateLimited | AppError::Llm(LlmError::RateLimited) => {
                let mut headers = HeaderMap::new();
                headers.insert("Retry-After", HeaderValue::from_static("60"));
                (StatusCode::TOO_MANY_REQUESTS, headers, "Rate limited").into_response()
            }
            AppError::External(msg) => (StatusCode::BAD_GATEWAY, msg).into_response(),
            AppError::Llm(e) => (StatusCode::BAD_GATEWAY, e.to_string()).into_response(),
        }
    }
}

impl From<PriceProviderError> for AppError {
    fn from(value: PriceProviderError) -> Self {
        match value {
            PriceProviderError::RateLimited => AppError::RateLimited,
            other => AppError::External(other.to_string()),
        }
    }
}
