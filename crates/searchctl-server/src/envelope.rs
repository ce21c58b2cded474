//! The common `{code, message, data, timestamp}` response envelope and the
//! error-kind to HTTP status mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use searchctl_core::{CtlError, ErrorKind};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct Envelope {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    pub timestamp: chrono::DateTime<Utc>,
}

/// Wraps a successful payload in the standard envelope.
pub fn ok<T: Serialize>(payload: &T) -> Response {
    let body = Envelope {
        code: 200,
        message: "ok".into(),
        data: serde_json::to_value(payload).ok(),
        timestamp: Utc::now(),
    };
    (StatusCode::OK, Json(body)).into_response()
}

/// Maps an error kind to its HTTP status: `BadRequest`→400,
/// `NotFound`→404, `Conflict`→409, everything else→500.
const fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::ValidationFailed | ErrorKind::EngineError | ErrorKind::Internal => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// The type returned by every admin/search handler.
pub struct ApiError(pub CtlError);

impl From<CtlError> for ApiError {
    fn from(err: CtlError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(self.0.kind());
        tracing::warn!(error = %self.0, status = %status, "request failed");
        let body = Envelope {
            code: status.as_u16(),
            message: self.0.to_string(),
            data: None,
            timestamp: Utc::now(),
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
