//! Execute one compiled binary against one test case under a time limit (§4.3).

use std::process::Stdio;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::io::AsyncReadExt;
use tokio::process::Command;

use crate::comparator::{self, CompareError};

use super::streams::{Streams, StreamsProvider};
use super::{TestCaseInfo, TestResult, TestStatus};

/// Produces a `TestResult` from an executable and a `TestCaseInfo`.
#[async_trait]
pub trait Runner: Send + Sync {
  async fn run(&self, executable: &str, info: &TestCaseInfo) -> TestResult;
}

/// Default runner: spawns the executable as a child process, enforces the
/// test case's wall-clock time limit, and delegates output comparison to
/// the comparator (§4.1).
pub struct DefaultRunner {
  streams_provider: Arc<dyn StreamsProvider>,
}

impl DefaultRunner {
  pub fn new(streams_provider: Arc<dyn StreamsProvider>) -> Self {
    Self { streams_provider }
  }
}

#[async_trait]
impl Runner for DefaultRunner {
  async fn run(&self, executable: &str, info: &TestCaseInfo) -> TestResult {
    let streams = match self.streams_provider.open(info).await {
      Ok(s) => s,
      Err(e) => {
        return TestResult::new(
          TestStatus::InternalError,
          format!("unable to open data streams: {e}"),
          std::time::Duration::ZERO,
        )
      }
    };

    run_with_tmp_output(executable, info, streams).await
  }
}

async fn run_with_tmp_output(executable: &str, info: &TestCaseInfo, streams: Streams) -> TestResult {
  let tmp_stdout = match NamedTempFile::new() {
    Ok(f) => f,
    Err(e) => {
      return TestResult::new(
        TestStatus::InternalError,
        format!("unable to open temporary output file: {e}"),
        std::time::Duration::ZERO,
      )
    }
  };
  let tmp_stderr = match NamedTempFile::new() {
    Ok(f) => f,
    Err(e) => {
      return TestResult::new(
        TestStatus::InternalError,
        format!("unable to open temporary output file: {e}"),
        std::time::Duration::ZERO,
      )
    }
  };

  // `NamedTempFile` deletes itself on drop, guaranteeing cleanup on every
  // exit path out of `execute` below.
  execute(executable, info, streams, &tmp_stdout, &tmp_stderr).await
}

async fn execute(
  executable: &str,
  info: &TestCaseInfo,
  streams: Streams,
  tmp_stdout: &NamedTempFile,
  tmp_stderr: &NamedTempFile,
) -> TestResult {
  let Streams {
    input,
    expected_output,
  } = streams;

  let stdin_file = input.into_std().await;

  let stdout_file = match tmp_stdout.reopen() {
    Ok(f) => f,
    Err(e) => {
      return TestResult::new(
        TestStatus::InternalError,
        format!("unable to reopen temporary stdout: {e}"),
        std::time::Duration::ZERO,
      )
    }
  };
  let stderr_file = match tmp_stderr.reopen() {
    Ok(f) => f,
    Err(e) => {
      return TestResult::new(
        TestStatus::InternalError,
        format!("unable to reopen temporary stderr: {e}"),
        std::time::Duration::ZERO,
      )
    }
  };

  let mut child = match Command::new(executable)
    .stdin(Stdio::from(stdin_file))
    .stdout(Stdio::from(stdout_file))
    .stderr(Stdio::from(stderr_file))
    .spawn()
  {
    Ok(c) => c,
    Err(e) => {
      return TestResult::new(
        TestStatus::InternalError,
        format!("unable to spawn executable '{executable}': {e}"),
        std::time::Duration::ZERO,
      )
    }
  };

  let start = Instant::now();
  let wait_result = tokio::time::timeout(info.time_limit, child.wait()).await;
  let duration = start.elapsed();

  let status = match wait_result {
    Err(_) => {
      let _ = child.kill().await;
      return TestResult::new(
        TestStatus::TimeLimitExceeded,
        format!(
          "time limit exceeded: test case was aborted after '{:?}'",
          info.time_limit
        ),
        duration,
      );
    }
    Ok(Err(e)) => {
      return TestResult::new(
        TestStatus::InternalError,
        format!("unable to wait for executable '{executable}': {e}"),
        duration,
      )
    }
    Ok(Ok(status)) => status,
  };

  if !status.success() {
    let stderr_contents = read_all(tmp_stderr).await.unwrap_or_default();
    return TestResult::new(
      TestStatus::RuntimeError,
      format!(
        "unable to run executable '{}' on test input file '{}'. Stderr:{}",
        executable,
        info.name,
        String::from_utf8_lossy(&stderr_contents)
      ),
      duration,
    );
  }

  let actual = match tmp_stdout.reopen() {
    Ok(f) => f,
    Err(e) => {
      return TestResult::new(
        TestStatus::InternalError,
        format!(
          "unable to rewind generated output for test '{}': {e}",
          info.name
        ),
        duration,
      )
    }
  };

  let expected = expected_output.into_std().await;

  let comparison = tokio::task::spawn_blocking(move || comparator::compare(expected, actual)).await;

  match comparison {
    Ok(Ok(())) => TestResult::new(TestStatus::Accepted, "OK", duration),
    Ok(Err(CompareError::LineMismatch {
      line,
      expected,
      actual,
    })) => TestResult::new(
      TestStatus::WrongAnswer,
      format!("outputs differ in line {line}: expected: '{expected}', actual: '{actual}'"),
      duration,
    ),
    Ok(Err(CompareError::TrailingContent)) => TestResult::new(
      TestStatus::WrongAnswer,
      "contains additional non-empty lines",
      duration,
    ),
    Err(e) => TestResult::new(
      TestStatus::InternalError,
      format!("comparator task panicked: {e}"),
      duration,
    ),
  }
}

async fn read_all(f: &NamedTempFile) -> Result<Vec<u8>, std::io::Error> {
  let mut file = tokio::fs::File::from_std(f.reopen()?);
  let mut buf = Vec::new();
  file.read_to_end(&mut buf).await?;
  Ok(buf)
}
