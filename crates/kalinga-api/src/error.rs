//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Store failures are mapped onto HTTP statuses through
//! [`kalinga_core::store::ClassifyError`], so handlers stay generic over
//! the backend. Storage-class failures are logged server-side and surface
//! only a message string.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use kalinga_core::store::{ClassifyError, ErrorClass};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  Validation(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store busy; try again")]
  Busy,

  #[error("store error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Translate a backend failure using its [`ErrorClass`].
  pub fn from_store<E>(err: E) -> Self
  where
    E: std::error::Error + ClassifyError + Send + Sync + 'static,
  {
    match err.class() {
      ErrorClass::Validation => Self::Validation(err.to_string()),
      ErrorClass::NotFound => Self::NotFound(err.to_string()),
      ErrorClass::Conflict => Self::Conflict(err.to_string()),
      ErrorClass::Busy => Self::Busy,
      ErrorClass::Storage => Self::Storage(Box::new(err)),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Validation(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Busy => {
        (StatusCode::SERVICE_UNAVAILABLE, self.to_string())
      }
      ApiError::Storage(e) => {
        tracing::error!("store failure: {e}");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          "internal storage error".to_string(),
        )
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
