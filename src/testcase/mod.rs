//! Test-case data model, execution (§4.3), and archive discovery (§4.4).

pub mod archive;
pub mod runner;
pub mod streams;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationNanoSeconds};

/// Static description of one test case for a problem.
#[serde_as]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseInfo {
  pub name: String,

  #[serde_as(as = "DurationNanoSeconds<u64>")]
  pub time_limit: Duration,

  /// Retained for forward compatibility; currently unenforced (§9).
  pub memory_limit: u64,
}

impl TestCaseInfo {
  pub fn new(name: impl Into<String>, time_limit: Duration, memory_limit: u64) -> Self {
    Self {
      name: name.into(),
      time_limit,
      memory_limit,
    }
  }
}

/// Verdict assigned by the Runner to a single test case.
///
/// `NotRunYet` is never produced by the Runner itself; it exists only as a
/// schema placeholder inherited from the system this judge's persisted
/// status vocabulary was distilled from.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum TestStatus {
  NotRunYet,
  InternalError,
  TimeLimitExceeded,
  MemoryLimitExceeded,
  WrongAnswer,
  Accepted,
  RuntimeError,
}

/// Outcome of running one test case.
#[serde_as]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
  pub status: TestStatus,
  pub description: String,

  #[serde_as(as = "DurationNanoSeconds<u64>")]
  pub duration: Duration,
}

impl TestResult {
  pub fn new(status: TestStatus, description: impl Into<String>, duration: Duration) -> Self {
    Self {
      status,
      description: description.into(),
      duration,
    }
  }
}

/// A test case paired with the result of running it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CompletedTestCase {
  pub info: TestCaseInfo,
  pub result: TestResult,
}

/// Sorts completed test cases by test name, the ordering guarantee every
/// save during `RunningTests` must uphold (§5).
pub fn sort_by_name(cases: &mut [CompletedTestCase]) {
  cases.sort_by(|a, b| a.info.name.cmp(&b.info.name));
}
