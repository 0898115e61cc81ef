use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Request-level failures of the analyze operation
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("Missing 'url'")]
    MissingUrl,

    #[error("Invalid YouTube URL")]
    InvalidUrl,

    #[error("No transcript available or too short")]
    TranscriptUnavailable,

    #[error("Analysis failed: {0}")]
    Internal(String),
}

impl AnalyzeError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AnalyzeError::MissingUrl | AnalyzeError::InvalidUrl | AnalyzeError::TranscriptUnavailable => {
                StatusCode::BAD_REQUEST
            }
            AnalyzeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Body returned for every request-level failure
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for AnalyzeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{self}");
        } else {
            log::debug!("Rejected request: {self}");
        }
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}
