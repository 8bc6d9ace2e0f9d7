//! HTTP surface: multipart submit, submission reads, health (§6).

mod handler;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::submission::processor::Processor;
use crate::submission::storage::SharedStorage;

/// Shared state handed to every handler via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
  inner: Arc<AppStateInner>,
}

struct AppStateInner {
  storage: SharedStorage,
  processor: Arc<Processor>,
}

impl AppState {
  pub fn new(storage: SharedStorage, processor: Arc<Processor>) -> Self {
    Self {
      inner: Arc::new(AppStateInner { storage, processor }),
    }
  }

  pub fn storage(&self) -> &SharedStorage {
    &self.inner.storage
  }

  pub fn processor(&self) -> &Processor {
    &self.inner.processor
  }
}

pub fn routes(state: AppState) -> Router {
  Router::new()
    .route("/healthz", get(handler::healthz))
    .route("/api/submit", post(handler::submit))
    .route("/api/submission/:problem/:id", get(handler::download_source))
    .route("/api/submissions/:id", get(handler::get_submission))
    .route("/api/submissions", get(handler::list_submissions))
    .layer(TraceLayer::new_for_http())
    .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
    .with_state(state)
}
