//! Per-test-case input/expected-output handles (§3 "Streams").

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs::File;

use super::TestCaseInfo;

#[derive(Debug, Error)]
pub enum StreamsError {
  #[error("unable to open input file '{0}': {1}")]
  Input(PathBuf, #[source] std::io::Error),

  #[error("unable to open expected output file '{0}': {1}")]
  ExpectedOutput(PathBuf, #[source] std::io::Error),
}

/// Fresh, disjoint input/expected-output handles for one test case. The
/// caller owns these for the duration of a single `Runner::run` and must
/// call `close` exactly once.
pub struct Streams {
  pub input: File,
  pub expected_output: File,
}

impl Streams {
  /// Releases the underlying handles. Files are also closed on drop, but
  /// calling this explicitly documents the ownership contract from §3.
  pub async fn close(self) {
    drop(self.input);
    drop(self.expected_output);
  }
}

/// Factory returning fresh `Streams` for a given test case.
#[async_trait]
pub trait StreamsProvider: Send + Sync {
  async fn open(&self, info: &TestCaseInfo) -> Result<Streams, StreamsError>;
}

/// Opens `<dir>/<name>.in` and `<dir>/<name>.out` for each test case.
pub struct DirectoryStreamsProvider {
  dir: PathBuf,
}

impl DirectoryStreamsProvider {
  pub fn new(dir: impl AsRef<Path>) -> Self {
    Self {
      dir: dir.as_ref().to_path_buf(),
    }
  }
}

#[async_trait]
impl StreamsProvider for DirectoryStreamsProvider {
  async fn open(&self, info: &TestCaseInfo) -> Result<Streams, StreamsError> {
    let input_path = self.dir.join(format!("{}.in", info.name));
    let output_path = self.dir.join(format!("{}.out", info.name));

    let input = File::open(&input_path)
      .await
      .map_err(|e| StreamsError::Input(input_path, e))?;
    let expected_output = File::open(&output_path)
      .await
      .map_err(|e| StreamsError::ExpectedOutput(output_path, e))?;

    Ok(Streams {
      input,
      expected_output,
    })
  }
}
