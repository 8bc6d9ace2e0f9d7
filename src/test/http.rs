use std::sync::Arc;

use tempfile::TempDir;
use tokio::net::TcpListener;

use crate::compile::CompilationMode;
use crate::http;
use crate::submission::metadata::Metadata;
use crate::submission::processor::Processor;
use crate::submission::storage::{FsStorage, Storage};
use crate::testcase::archive::DirectoryArchive;

struct TestServer {
  base_url: String,
  _processor: Arc<Processor>,
  // Held for the lifetime of the server so the backing directories aren't
  // removed while the spawned task is still using them.
  _submissions_root: TempDir,
  _problems_root: TempDir,
}

async fn spawn_server() -> TestServer {
  let submissions_root = TempDir::new().unwrap();
  let problems_root = TempDir::new().unwrap();
  std::fs::create_dir(problems_root.path().join("aplusb")).unwrap();

  let storage: Arc<dyn Storage> = Arc::new(FsStorage::new(submissions_root.path()));
  storage.init().await.unwrap();

  let archive = Arc::new(DirectoryArchive::new(problems_root.path()));
  let processor = Arc::new(Processor::new(storage.clone(), archive));
  let state = http::AppState::new(storage, processor.clone());
  let app = http::routes(state);

  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move {
    axum::serve(listener, app).await.unwrap();
  });

  TestServer {
    base_url: format!("http://{addr}"),
    _processor: processor,
    _submissions_root: submissions_root,
    _problems_root: problems_root,
  }
}

#[tokio::test]
async fn healthz_reports_ok() {
  let server = spawn_server().await;
  let resp = reqwest::get(format!("{}/healthz", server.base_url)).await.unwrap();
  assert!(resp.status().is_success());
  let body: serde_json::Value = resp.json().await.unwrap();
  assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn submitting_then_reading_back_the_submission_round_trips() {
  let server = spawn_server().await;
  let base = &server.base_url;
  let client = reqwest::Client::new();

  let form = reqwest::multipart::Form::new()
    .text("problemName", "aplusb")
    .text("compilationMode", "0")
    .part(
      "solution",
      reqwest::multipart::Part::bytes(b"int main(){}".to_vec()).file_name("sol.cpp"),
    );

  let resp = client
    .post(format!("{base}/api/submit"))
    .multipart(form)
    .send()
    .await
    .unwrap();
  assert_eq!(resp.status(), reqwest::StatusCode::ACCEPTED);

  let body: serde_json::Value = resp.json().await.unwrap();
  let id = body["id"].as_str().unwrap().to_string();

  let meta_resp = client
    .get(format!("{base}/api/submissions/{id}"))
    .send()
    .await
    .unwrap();
  assert!(meta_resp.status().is_success());
  let meta: Metadata = meta_resp.json().await.unwrap();
  assert_eq!(meta.compilation_mode, CompilationMode::Release);

  let list_resp = client.get(format!("{base}/api/submissions")).send().await.unwrap();
  let list: Vec<Metadata> = list_resp.json().await.unwrap();
  assert!(list.iter().any(|m| m.id == meta.id));
}

#[tokio::test]
async fn unknown_submission_id_is_a_404() {
  let server = spawn_server().await;
  let resp = reqwest::get(format!(
    "{}/api/submissions/00000000-0000-0000-0000-000000000000",
    server.base_url
  ))
  .await
  .unwrap();
  assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
}
