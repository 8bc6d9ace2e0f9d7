use axum::{http::StatusCode, response::IntoResponse};
use thiserror::Error;

use crate::submission::{processor::SubmitError, storage::StorageError};

/// Error surfaced by the HTTP layer, folding component errors into a response.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("submission not found")]
  NotFound,

  #[error("invalid request: {0}")]
  BadRequest(String),

  #[error(transparent)]
  Storage(#[from] StorageError),

  #[error(transparent)]
  Submit(#[from] SubmitError),

  #[error("internal error: {0}")]
  Internal(String),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> axum::response::Response {
    let status = match &self {
      ApiError::NotFound => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
      ApiError::Submit(_) => StatusCode::SERVICE_UNAVAILABLE,
      ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, self.to_string()).into_response()
  }
}
