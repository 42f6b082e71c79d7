//! HTTP error mapping.

use api_shared::DatasetUnavailable;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use lipid_report::ReportError;
use serde_json::{json, Value};

/// Errors returned by handlers. Every variant renders as `{"detail": ...}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("{0}")]
    Unprocessable(String),
    #[error("lipid dataset not loaded")]
    DatasetUnavailable(DatasetUnavailable),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::DatasetUnavailable(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn detail(&self) -> Value {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::PayloadTooLarge(msg)
            | ApiError::Unprocessable(msg) => Value::String(msg.clone()),
            ApiError::DatasetUnavailable(info) => json!(info),
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                Value::String("Internal error".into())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "detail": self.detail() }))).into_response()
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::UnsupportedFileType | ReportError::EmptyFile => {
                ApiError::BadRequest(err.to_string())
            }
            ReportError::TooLarge { .. } => ApiError::PayloadTooLarge(err.to_string()),
            ReportError::PdfParsing(ref cause) => {
                tracing::warn!("pdf extraction failed: {cause}");
                ApiError::Unprocessable(err.to_string())
            }
            ReportError::ExtractionTask(_) | ReportError::Session(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<lipid_core::LipidError> for ApiError {
    fn from(err: lipid_core::LipidError) -> Self {
        ApiError::Internal(err.to_string())
    }
}
