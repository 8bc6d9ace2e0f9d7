//! Single-writer queue consumer driving the submission state machine (§4.6).

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tokio::sync::{mpsc, Mutex};

use crate::compile;
use crate::testcase::archive::{Archive, ArchiveError};
use crate::testcase::{sort_by_name, CompletedTestCase};

use super::metadata::{Metadata, Status};
use super::storage::{SharedStorage, StorageError};

/// Bounded FIFO capacity for the intake queue (§4.6).
const QUEUE_CAPACITY: usize = 1000;

#[derive(Debug, Error)]
pub enum SubmitError {
  #[error("submission queue is full (capacity {0})")]
  QueueFull(usize),

  #[error("submission processor has shut down")]
  ShutDown,
}

#[derive(Debug, Error)]
pub enum ProcessError {
  #[error("failed to load existing submissions: {0}")]
  Storage(#[from] StorageError),
}

/// Processes submissions: a single-writer queue consumer that drives the
/// per-submission state machine and fans test cases out to a worker pool.
pub struct Processor {
  tx: std::sync::Mutex<Option<mpsc::Sender<Metadata>>>,
  rx: Mutex<Option<mpsc::Receiver<Metadata>>>,
  storage: SharedStorage,
  archive: Arc<dyn Archive>,
}

impl Processor {
  pub fn new(storage: SharedStorage, archive: Arc<dyn Archive>) -> Self {
    let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
    Self {
      tx: std::sync::Mutex::new(Some(tx)),
      rx: Mutex::new(Some(rx)),
      storage,
      archive,
    }
  }

  /// Enqueues `meta` for processing. Never blocks: if the queue is full the
  /// submission is rejected with an error the caller can surface or retry.
  pub fn submit(&self, meta: Metadata) -> Result<(), SubmitError> {
    let tx = {
      let guard = self.tx.lock().unwrap();
      guard.clone().ok_or(SubmitError::ShutDown)?
    };
    tx.try_send(meta).map_err(|e| match e {
      mpsc::error::TrySendError::Full(_) => SubmitError::QueueFull(QUEUE_CAPACITY),
      mpsc::error::TrySendError::Closed(_) => SubmitError::ShutDown,
    })
  }

  /// Closes the intake queue; `process` exits once in-flight submissions
  /// (and whatever was already queued) have drained.
  pub fn quit(&self) {
    *self.tx.lock().unwrap() = None;
  }

  /// Main loop: loads persisted submissions, then processes the queue one
  /// submission at a time until it is closed via `quit`.
  pub async fn process(&self) -> Result<(), ProcessError> {
    self.storage.load_all().await?;

    let mut rx = self
      .rx
      .lock()
      .await
      .take()
      .expect("process() must only be called once");

    while let Some(submission) = rx.recv().await {
      if let Err(e) = self.process_submission(submission).await {
        log::error!("processing submission failed: {e}");
      }
    }

    log::info!("submission processor has exited");
    Ok(())
  }

  async fn process_submission(&self, mut submission: Metadata) -> Result<(), ProcessingFailure> {
    let start = Instant::now();
    log::info!("processing submission {}", submission.id);

    submission.status = Status::Compiling;
    self.storage.save(submission.clone()).await?;

    let source = self.storage.download(&submission).await?;

    let executable = ExecutableGuard::new(format!(
      "{}-{}.out",
      submission.problem_name, submission.id
    ));

    let (output, ok) = match compile::compile(&source, submission.compilation_mode, executable.path_str()).await
    {
      Ok(r) => r,
      Err(e) => (format!("unable to run compiler: {e}").into_bytes(), false),
    };

    if !ok {
      submission.compilation_output = output;
      submission.status = Status::CompilationError;
      self.storage.save(submission).await?;
      return Ok(());
    }

    submission.status = Status::RunningTests;
    self.storage.save(submission.clone()).await?;

    let testcases = match self.archive.testcases(&submission.problem_name).await {
      Ok(t) => t,
      Err(e) => {
        // Left stuck at RunningTests: an accepted ambiguity, see §9.
        return Err(ProcessingFailure::Archive(e));
      }
    };
    let runner = self.archive.runner(&submission.problem_name);

    let n = testcases.len();
    let (job_tx, job_rx) = mpsc::channel(n.max(1));
    for tc in testcases {
      // Buffer is sized to `n`, so this never blocks.
      let _ = job_tx.send(tc).await;
    }
    drop(job_tx);
    let job_rx = Arc::new(Mutex::new(job_rx));

    let (result_tx, mut result_rx) = mpsc::channel(n.max(1));

    for _ in 0..submission.worker_count.max(1) {
      let job_rx = job_rx.clone();
      let result_tx = result_tx.clone();
      let runner = runner.clone();
      let executable_path = executable.path_str().to_string();
      tokio::spawn(async move {
        loop {
          let job = {
            let mut rx = job_rx.lock().await;
            rx.recv().await
          };
          let Some(job) = job else { break };
          let result = runner.run(&executable_path, &job).await;
          if result_tx
            .send(CompletedTestCase { info: job, result })
            .await
            .is_err()
          {
            break;
          }
        }
      });
    }
    drop(result_tx);

    let mut completed = Vec::with_capacity(n);
    for _ in 0..n {
      let Some(completed_case) = result_rx.recv().await else {
        break;
      };
      completed.push(completed_case);
      sort_by_name(&mut completed);
      submission.completed_test_cases = completed.clone();
      self.storage.save(submission.clone()).await?;
    }

    submission.status = Status::AllTestsCompleted;
    submission.total_processing_time = start.elapsed();
    self.storage.save(submission.clone()).await?;

    log::info!(
      "processed submission {} in {:?} ({}/{})",
      submission.id,
      submission.total_processing_time,
      submission.score(),
      submission.max_score()
    );
    Ok(())
  }
}

#[derive(Debug, Error)]
enum ProcessingFailure {
  #[error(transparent)]
  Storage(#[from] StorageError),

  #[error("unable to enumerate test cases: {0}")]
  Archive(#[from] ArchiveError),
}

/// Guards the uniquely-named temporary executable for one submission,
/// deleting it on every exit path out of `process_submission`.
struct ExecutableGuard {
  path: PathBuf,
}

impl ExecutableGuard {
  fn new(file_name: String) -> Self {
    Self {
      path: env::temp_dir().join(file_name),
    }
  }

  fn path_str(&self) -> &str {
    self.path.to_str().expect("temp path is valid UTF-8")
  }
}

impl Drop for ExecutableGuard {
  fn drop(&mut self) {
    let _ = std::fs::remove_file(&self.path);
  }
}
