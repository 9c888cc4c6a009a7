//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  /// No load has completed yet.
  #[error("directory is still loading")]
  NotReady,

  /// The most recent load failed; carries its message.
  #[error("directory load failed: {0}")]
  LoadFailed(String),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self {
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::NotReady => StatusCode::SERVICE_UNAVAILABLE,
      ApiError::LoadFailed(_) => StatusCode::BAD_GATEWAY,
    };
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}
