//! Route handlers for the submission API (§6).

use axum::extract::{Multipart, Path, State};
use axum::response::IntoResponse;
use axum::{http::StatusCode, Json};
use serde::Serialize;

use crate::compile::CompilationMode;
use crate::error::ApiError;
use crate::submission::metadata::{Metadata, SubmissionId};

use super::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
  status: &'static str,
}

pub async fn healthz() -> Json<HealthResponse> {
  Json(HealthResponse { status: "ok" })
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
  id: SubmissionId,
}

/// `POST /api/submit` — multipart fields `problemName`, `compilationMode`,
/// file `solution`.
pub async fn submit(
  State(state): State<AppState>,
  mut multipart: Multipart,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
  let mut problem_name: Option<String> = None;
  let mut compilation_mode: Option<CompilationMode> = None;
  let mut solution: Option<Vec<u8>> = None;

  while let Some(field) = multipart
    .next_field()
    .await
    .map_err(|e| ApiError::BadRequest(e.to_string()))?
  {
    let name = field.name().unwrap_or("").to_string();
    match name.as_str() {
      "problemName" => {
        problem_name = Some(
          field
            .text()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?,
        );
      }
      "compilationMode" => {
        let raw = field
          .text()
          .await
          .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        let ordinal: u8 = raw
          .parse()
          .map_err(|_| ApiError::BadRequest(format!("compilationMode must be numeric, got '{raw}'")))?;
        compilation_mode = Some(
          CompilationMode::from_ordinal(ordinal)
            .ok_or_else(|| ApiError::BadRequest(format!("unknown compilation mode '{ordinal}'")))?,
        );
      }
      "solution" => {
        solution = Some(
          field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?
            .to_vec(),
        );
      }
      _ => {}
    }
  }

  let problem_name = problem_name.ok_or_else(|| ApiError::BadRequest("missing problemName".into()))?;
  let compilation_mode =
    compilation_mode.ok_or_else(|| ApiError::BadRequest("missing compilationMode".into()))?;
  let solution = solution.ok_or_else(|| ApiError::BadRequest("missing solution file".into()))?;

  let meta = Metadata::new(problem_name, compilation_mode);
  let id = meta.id;

  state.storage().upload(meta.clone(), &solution).await?;
  state.processor().submit(meta)?;

  Ok((StatusCode::ACCEPTED, Json(SubmitResponse { id })))
}

/// `GET /api/submission/:problem/:id` — raw uploaded solution source.
pub async fn download_source(
  State(state): State<AppState>,
  Path((_problem, id)): Path<(String, uuid::Uuid)>,
) -> Result<Vec<u8>, ApiError> {
  let id = SubmissionId(id);
  let meta = state.storage().get(id).await.ok_or(ApiError::NotFound)?;
  let source = state.storage().download(&meta).await?;
  Ok(source)
}

/// `GET /api/submissions/:id` — current Metadata as JSON.
pub async fn get_submission(
  State(state): State<AppState>,
  Path(id): Path<uuid::Uuid>,
) -> Result<Json<Metadata>, ApiError> {
  let meta = state
    .storage()
    .get(SubmissionId(id))
    .await
    .ok_or(ApiError::NotFound)?;
  Ok(Json(meta))
}

/// `GET /api/submissions` — all submissions, newest first.
pub async fn list_submissions(State(state): State<AppState>) -> Json<Vec<Metadata>> {
  Json(state.storage().list().await)
}
