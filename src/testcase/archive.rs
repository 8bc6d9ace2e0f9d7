//! Enumerate problems and test cases on disk; build a Runner for one (§4.4).

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use super::runner::{DefaultRunner, Runner};
use super::streams::DirectoryStreamsProvider;
use super::TestCaseInfo;

const TEST_CASE_EXTENSION: &str = ".in";
const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ArchiveError {
  #[error("unable to read archive root '{0}': {1}")]
  ReadRoot(PathBuf, #[source] std::io::Error),

  #[error("unable to read problem directory '{0}': {1}")]
  ReadProblem(PathBuf, #[source] std::io::Error),
}

/// Enumerates problems; enumerates test-case infos; constructs a Runner
/// bound to a problem's data streams.
#[async_trait]
pub trait Archive: Send + Sync {
  async fn problems(&self) -> Result<Vec<String>, ArchiveError>;
  async fn testcases(&self, problem: &str) -> Result<Vec<TestCaseInfo>, ArchiveError>;
  fn runner(&self, problem: &str) -> Arc<dyn Runner>;
}

/// Archive backed by a directory tree: `<root>/<problem>/<name>.in|.out`.
pub struct DirectoryArchive {
  root: PathBuf,
}

impl DirectoryArchive {
  pub fn new(root: impl AsRef<Path>) -> Self {
    Self {
      root: root.as_ref().to_path_buf(),
    }
  }
}

#[async_trait]
impl Archive for DirectoryArchive {
  async fn problems(&self) -> Result<Vec<String>, ArchiveError> {
    let mut entries = tokio::fs::read_dir(&self.root)
      .await
      .map_err(|e| ArchiveError::ReadRoot(self.root.clone(), e))?;

    let mut problems = Vec::new();
    while let Some(entry) = entries
      .next_entry()
      .await
      .map_err(|e| ArchiveError::ReadRoot(self.root.clone(), e))?
    {
      if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
        if let Some(name) = entry.file_name().to_str() {
          problems.push(name.to_string());
        }
      }
    }
    problems.sort();
    Ok(problems)
  }

  async fn testcases(&self, problem: &str) -> Result<Vec<TestCaseInfo>, ArchiveError> {
    let dir = self.root.join(problem);
    let mut entries = tokio::fs::read_dir(&dir)
      .await
      .map_err(|e| ArchiveError::ReadProblem(dir.clone(), e))?;

    let mut testcases = Vec::new();
    while let Some(entry) = entries
      .next_entry()
      .await
      .map_err(|e| ArchiveError::ReadProblem(dir.clone(), e))?
    {
      let name = entry.file_name();
      let Some(name) = name.to_str() else {
        continue;
      };
      if let Some(stem) = name.strip_suffix(TEST_CASE_EXTENSION) {
        testcases.push(TestCaseInfo::new(stem, DEFAULT_TIME_LIMIT, 0));
      }
    }
    Ok(testcases)
  }

  fn runner(&self, problem: &str) -> Arc<dyn Runner> {
    let provider = Arc::new(DirectoryStreamsProvider::new(self.root.join(problem)));
    Arc::new(DefaultRunner::new(provider))
  }
}
