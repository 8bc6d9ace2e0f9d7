use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::time::timeout;

use crate::compile::CompilationMode;
use crate::submission::metadata::{Metadata, Status};
use crate::submission::processor::Processor;
use crate::submission::storage::{FsStorage, Storage};
use crate::testcase::archive::DirectoryArchive;

fn write_case(dir: &std::path::Path, name: &str, input: &str, output: &str) {
  std::fs::write(dir.join(format!("{name}.in")), input).unwrap();
  std::fs::write(dir.join(format!("{name}.out")), output).unwrap();
}

#[tokio::test]
async fn a_submission_runs_every_test_case_and_completes_in_name_order() {
  let problems_root = TempDir::new().unwrap();
  let problem_dir = problems_root.path().join("aplusb");
  std::fs::create_dir(&problem_dir).unwrap();
  // Names deliberately out of creation order; completion must still be
  // persisted sorted by name regardless of finish order (§5).
  write_case(&problem_dir, "03", "anything\n", "anything\n");
  write_case(&problem_dir, "01", "anything\n", "anything\n");
  write_case(&problem_dir, "02", "anything\n", "anything\n");

  let submissions_root = TempDir::new().unwrap();
  let storage: Arc<dyn Storage> = Arc::new(FsStorage::new(submissions_root.path()));
  storage.init().await.unwrap();
  let archive = Arc::new(DirectoryArchive::new(problems_root.path()));
  let processor = Arc::new(Processor::new(storage.clone(), archive));

  let mut meta = Metadata::new("aplusb", CompilationMode::Release);
  meta.worker_count = 5;
  let id = meta.id;
  storage
    .upload(meta.clone(), b"int main() { return 0; }")
    .await
    .unwrap();

  let worker = {
    let processor = processor.clone();
    tokio::spawn(async move { processor.process().await })
  };
  processor.submit(meta).unwrap();

  let final_meta = timeout(Duration::from_secs(30), async {
    loop {
      if let Some(m) = storage.get(id).await {
        if m.status == Status::AllTestsCompleted {
          return m;
        }
      }
      tokio::time::sleep(Duration::from_millis(20)).await;
    }
  })
  .await
  .expect("submission did not complete in time");

  processor.quit();
  let _ = worker.await;

  let names: Vec<_> = final_meta
    .completed_test_cases
    .iter()
    .map(|c| c.info.name.clone())
    .collect();
  assert_eq!(names, vec!["01".to_string(), "02".to_string(), "03".to_string()]);
  assert_eq!(final_meta.max_score(), 3);
}

#[tokio::test]
async fn a_broken_solution_is_left_in_compilation_error_without_running_tests() {
  let problems_root = TempDir::new().unwrap();
  std::fs::create_dir(problems_root.path().join("aplusb")).unwrap();
  write_case(&problems_root.path().join("aplusb"), "01", "1\n", "1\n");

  let submissions_root = TempDir::new().unwrap();
  let storage: Arc<dyn Storage> = Arc::new(FsStorage::new(submissions_root.path()));
  storage.init().await.unwrap();
  let archive = Arc::new(DirectoryArchive::new(problems_root.path()));
  let processor = Arc::new(Processor::new(storage.clone(), archive));

  let meta = Metadata::new("aplusb", CompilationMode::Release);
  let id = meta.id;
  storage.upload(meta.clone(), b"this is not valid c++").await.unwrap();

  let worker = {
    let processor = processor.clone();
    tokio::spawn(async move { processor.process().await })
  };
  processor.submit(meta).unwrap();

  let final_meta = timeout(Duration::from_secs(30), async {
    loop {
      if let Some(m) = storage.get(id).await {
        if m.status == Status::CompilationError {
          return m;
        }
      }
      tokio::time::sleep(Duration::from_millis(20)).await;
    }
  })
  .await
  .expect("submission did not reach CompilationError in time");

  processor.quit();
  let _ = worker.await;

  assert!(final_meta.completed_test_cases.is_empty());
  assert!(!final_meta.compilation_output.is_empty());
}

#[tokio::test]
async fn submit_rejects_once_the_queue_is_full() {
  let submissions_root = TempDir::new().unwrap();
  let storage: Arc<dyn Storage> = Arc::new(FsStorage::new(submissions_root.path()));
  storage.init().await.unwrap();
  let problems_root = TempDir::new().unwrap();
  let archive = Arc::new(DirectoryArchive::new(problems_root.path()));
  let processor = Processor::new(storage, archive);

  // The consumer is never started, so the bounded queue fills up.
  for _ in 0..1000 {
    processor
      .submit(Metadata::new("aplusb", CompilationMode::Release))
      .unwrap();
  }
  assert!(processor
    .submit(Metadata::new("aplusb", CompilationMode::Release))
    .is_err());
}

#[tokio::test]
async fn quit_closes_the_intake_queue() {
  let submissions_root = TempDir::new().unwrap();
  let storage: Arc<dyn Storage> = Arc::new(FsStorage::new(submissions_root.path()));
  storage.init().await.unwrap();
  let problems_root = TempDir::new().unwrap();
  let archive = Arc::new(DirectoryArchive::new(problems_root.path()));
  let processor = Processor::new(storage, archive);

  processor.quit();
  assert!(processor
    .submit(Metadata::new("aplusb", CompilationMode::Release))
    .is_err());
}
