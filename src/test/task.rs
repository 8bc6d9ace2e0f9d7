use tempfile::TempDir;

use crate::compile::CompilationMode;
use crate::submission::metadata::Metadata;
use crate::submission::storage::{FsStorage, Storage};

#[tokio::test]
async fn upload_then_get_round_trips_metadata() {
  let dir = TempDir::new().unwrap();
  let storage = FsStorage::new(dir.path());
  storage.init().await.unwrap();

  let meta = Metadata::new("aplusb", CompilationMode::Release);
  let id = meta.id;
  storage.upload(meta.clone(), b"int main(){}").await.unwrap();

  let fetched = storage.get(id).await.unwrap();
  assert_eq!(fetched, meta);

  let source = storage.download(&fetched).await.unwrap();
  assert_eq!(source, b"int main(){}");
}

#[tokio::test]
async fn list_orders_newest_submission_first() {
  let dir = TempDir::new().unwrap();
  let storage = FsStorage::new(dir.path());
  storage.init().await.unwrap();

  let mut older = Metadata::new("aplusb", CompilationMode::Release);
  older.submitted_at = chrono::Utc::now() - chrono::Duration::seconds(60);
  let newer = Metadata::new("aplusb", CompilationMode::Release);

  storage.save(older.clone()).await.unwrap();
  storage.save(newer.clone()).await.unwrap();

  let all = storage.list().await;
  assert_eq!(all[0].id, newer.id);
  assert_eq!(all[1].id, older.id);
}

#[tokio::test]
async fn load_all_recovers_submissions_from_disk_after_a_restart() {
  let dir = TempDir::new().unwrap();
  let meta = {
    let storage = FsStorage::new(dir.path());
    storage.init().await.unwrap();
    let meta = Metadata::new("aplusb", CompilationMode::Release);
    storage.upload(meta.clone(), b"source").await.unwrap();
    meta
  };

  let restarted = FsStorage::new(dir.path());
  restarted.load_all().await.unwrap();

  let recovered = restarted.get(meta.id).await.unwrap();
  assert_eq!(recovered, meta);
}

#[tokio::test]
async fn upload_does_not_save_metadata_when_the_source_write_fails() {
  let dir = TempDir::new().unwrap();
  let storage = FsStorage::new(dir.path());
  storage.init().await.unwrap();

  let mut meta = Metadata::new("aplusb", CompilationMode::Release);
  meta.problem_name = "aplusb".to_string();
  // Block the problem directory with a plain file so `create_dir_all` fails.
  std::fs::write(dir.path().join("aplusb"), b"not a directory").unwrap();

  assert!(storage.upload(meta.clone(), b"source").await.is_err());
  assert!(storage.get(meta.id).await.is_none());
}
