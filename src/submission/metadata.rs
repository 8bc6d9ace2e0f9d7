//! SubmissionId and Metadata, the unit of durable state for one submission (§3).

use std::fmt::Display;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{base64::Base64, serde_as, DurationNanoSeconds};
use uuid::Uuid;

use crate::compile::CompilationMode;
use crate::etc::CONFIG;
use crate::testcase::CompletedTestCase;

/// Opaque 128-bit submission identifier, stringifiable as a lowercase
/// hyphenated UUID and round-trippable through JSON in that form.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubmissionId(pub Uuid);

impl SubmissionId {
  pub fn new() -> Self {
    Self(Uuid::new_v4())
  }
}

impl Default for SubmissionId {
  fn default() -> Self {
    Self::new()
  }
}

impl Display for SubmissionId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Status of a submission. Advances only along the edges in §4.6.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Status {
  Queued,
  Compiling,
  CompilationError,
  RunningTests,
  AllTestsCompleted,
}

/// The unit of durable state for one submission.
#[serde_as]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
  pub id: SubmissionId,
  pub submitted_at: DateTime<Utc>,
  pub problem_name: String,
  pub solution_filename: String,
  pub status: Status,
  pub executable_filename: String,

  #[serde_as(as = "Base64")]
  pub compilation_output: Vec<u8>,

  pub compilation_mode: CompilationMode,

  #[serde(rename = "testCases")]
  pub completed_test_cases: Vec<CompletedTestCase>,

  #[serde_as(as = "DurationNanoSeconds<u64>")]
  pub total_processing_time: Duration,

  pub worker_count: usize,
}

impl Metadata {
  /// Creates a new submission in `Queued` state. `worker_count` defaults to
  /// `CONFIG.default_worker_count` if set, else half the host CPU count,
  /// clamped to a minimum of 1 (§9).
  pub fn new(problem_name: impl Into<String>, compilation_mode: CompilationMode) -> Self {
    let id = SubmissionId::new();
    let worker_count = CONFIG
      .default_worker_count
      .unwrap_or_else(|| num_cpus() / 2)
      .max(1);
    Self {
      id,
      submitted_at: Utc::now(),
      problem_name: problem_name.into(),
      solution_filename: format!("{id}.cpp"),
      status: Status::Queued,
      executable_filename: format!("{id}.tsk"),
      compilation_output: Vec::new(),
      compilation_mode,
      completed_test_cases: Vec::new(),
      total_processing_time: Duration::ZERO,
      worker_count,
    }
  }

  /// Count of `Accepted` verdicts among the completed test cases.
  pub fn score(&self) -> usize {
    self
      .completed_test_cases
      .iter()
      .filter(|tc| tc.result.status == crate::testcase::TestStatus::Accepted)
      .count()
  }

  /// Number of test cases judged so far.
  pub fn max_score(&self) -> usize {
    self.completed_test_cases.len()
  }
}

fn num_cpus() -> usize {
  std::thread::available_parallelism()
    .map(|n| n.get())
    .unwrap_or(1)
}
