use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use super::GenerateResponse;

pub const GENERIC_FAILURE: &str = "Image generation request failed";

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("{0}")]
    Validation(String),
    #[error("LEONARDO_API_KEY not configured")]
    MissingApiKey,
    #[error("upstream returned {status}: {message}")]
    Upstream { status: StatusCode, message: String },
    #[error("generation {id} failed upstream")]
    GenerationFailed { id: String },
    #[error("generation {id} not complete after {attempts} status checks")]
    TimedOut { id: String, attempts: u32 },
    #[error("upstream request failed: {0}")]
    Transport(String),
    #[error("unexpected upstream response: {0}")]
    Decode(String),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Validation(_) => StatusCode::BAD_REQUEST,
            ProxyError::MissingApiKey => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::Upstream { status, .. } => *status,
            ProxyError::GenerationFailed { .. } => StatusCode::BAD_GATEWAY,
            ProxyError::TimedOut { .. } => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Transport(_) | ProxyError::Decode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message sent to callers. Transport and decoding details stay in the log.
    pub fn public_message(&self) -> String {
        match self {
            ProxyError::Upstream { message, .. } => message.clone(),
            ProxyError::Transport(_) | ProxyError::Decode(_) => GENERIC_FAILURE.to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::warn!("request failed with {status}: {self}");
        }
        let body = GenerateResponse {
            success: false,
            generation_id: None,
            error: Some(self.public_message()),
        };
        (status, Json(body)).into_response()
    }
}
