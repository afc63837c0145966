//! Mapping from the error taxonomy to HTTP responses. Every failure
//! becomes a stable machine-readable kind plus a human message; internal
//! detail never leaks past the boundary.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use jobgrid_common::JobGridError;

pub struct ApiError(pub JobGridError);

pub type ApiResult<T> = Result<T, ApiError>;

impl From<JobGridError> for ApiError {
    fn from(err: JobGridError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            JobGridError::NotFound(_) => StatusCode::NOT_FOUND,
            JobGridError::Forbidden(_) => StatusCode::FORBIDDEN,
            JobGridError::Conflict(_) => StatusCode::CONFLICT,
            JobGridError::Aborted(_) => StatusCode::SERVICE_UNAVAILABLE,
            JobGridError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };
        let body = json!({
            "error": {
                "kind": self.0.kind(),
                "message": self.0.to_string(),
            }
        });
        (status, Json(body)).into_response()
    }
}
