//! Application error types and their HTTP rendering.
//!
//! Every external call made while building a placement report is wrapped in
//! `AppError` and rendered as a structured JSON body with an appropriate
//! status code, so upstream faults never surface as bare 500s. The
//! `request_id` from the request span is attached for log correlation.

use axum::{
    http::{header::CACHE_CONTROL, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::config::CACHE_CONTROL_ERROR;
use crate::ecs::UpstreamError;
use crate::metadata::MetadataError;
use crate::middleware::RequestId;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Task metadata endpoint error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("ECS control plane error: {0}")]
    Upstream(#[from] UpstreamError),
}

impl AppError {
    /// Stable machine-readable kind for the JSON error body.
    fn kind(&self) -> &'static str {
        match self {
            AppError::Metadata(MetadataError::Network(_)) => "network",
            AppError::Metadata(MetadataError::Parse(_)) => "parse",
            AppError::Metadata(MetadataError::MissingField(_)) => "missing_field",
            AppError::Upstream(_) => "upstream",
        }
    }

    fn status(&self) -> StatusCode {
        // Every failure mode is a fault in an external collaborator, not in
        // the request itself.
        StatusCode::BAD_GATEWAY
    }
}

/// JSON body returned for failed requests.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_id: Option<Uuid>,
}

/// An `AppError` paired with the request ID it occurred under.
///
/// Handlers return this from their `Result` so the error response carries the
/// same correlation ID as the request span logs.
#[derive(Debug)]
pub struct AppErrorResponse {
    error: AppError,
    request_id: Option<Uuid>,
}

impl<E: Into<AppError>> From<E> for AppErrorResponse {
    fn from(error: E) -> Self {
        Self {
            error: error.into(),
            request_id: None,
        }
    }
}

impl IntoResponse for AppErrorResponse {
    fn into_response(self) -> Response {
        let status = self.error.status();
        tracing::error!(
            kind = self.error.kind(),
            status = status.as_u16(),
            error = %self.error,
            "Request failed"
        );

        let body = ErrorBody {
            error: self.error.kind(),
            message: self.error.to_string(),
            request_id: self.request_id,
        };

        let mut response = (status, Json(body)).into_response();
        response.headers_mut().insert(
            CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL_ERROR),
        );
        response
    }
}

/// Extension trait attaching the current request ID to fallible results.
pub trait ResultExt<T> {
    fn with_request_id(self, request_id: &RequestId) -> Result<T, AppErrorResponse>;
}

impl<T, E: Into<AppError>> ResultExt<T> for Result<T, E> {
    fn with_request_id(self, request_id: &RequestId) -> Result<T, AppErrorResponse> {
        self.map_err(|e| AppErrorResponse {
            error: e.into(),
            request_id: Some(request_id.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_errors_map_to_bad_gateway() {
        let error = AppError::Upstream(UpstreamError::new(
            "ListTasks",
            "ecs-capacityproviders",
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
        ));
        assert_eq!(error.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(error.kind(), "upstream");
    }

    #[test]
    fn missing_field_has_its_own_kind() {
        let error = AppError::Metadata(MetadataError::MissingField("TaskARN"));
        assert_eq!(error.kind(), "missing_field");
    }
}
