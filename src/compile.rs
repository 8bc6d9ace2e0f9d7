//! Invoke an external compiler, capture output & exit (§4.2).

use std::process::Stdio;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::etc::CONFIG;

/// Compilation mode, selecting both the compiler binary and its flags.
///
/// Serialized under the exact wire vocabulary required by the persisted
/// metadata schema (§6), not the Rust variant names.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum CompilationMode {
  #[serde(rename = "ReleaseMode")]
  Release,
  #[serde(rename = "AnalyzeClangMode")]
  AnalyzeClang,
  #[serde(rename = "AnalyzeGplusplusMode")]
  AnalyzeGplusplus,
}

#[derive(Debug, Error)]
pub enum CompileError {
  #[error("failed to spawn compiler: {0}")]
  Spawn(#[source] std::io::Error),

  #[error("failed to pipe source to compiler stdin: {0}")]
  Stdin(#[source] std::io::Error),

  #[error("failed to wait for compiler: {0}")]
  Wait(#[source] std::io::Error),
}

impl CompilationMode {
  /// Maps the numeric ordinal accepted over HTTP (§6) to a mode: `0` is
  /// `Release`, `1` is `AnalyzeClang`, `2` is `AnalyzeGplusplus`.
  pub fn from_ordinal(n: u8) -> Option<Self> {
    match n {
      0 => Some(CompilationMode::Release),
      1 => Some(CompilationMode::AnalyzeClang),
      2 => Some(CompilationMode::AnalyzeGplusplus),
      _ => None,
    }
  }

  /// Builds the command (program + args) for this mode, substituting
  /// `target` as the `-o` argument.
  fn command(&self, target: &str) -> (String, Vec<String>) {
    let s = |v: &[&str]| v.iter().map(|x| x.to_string()).collect::<Vec<_>>();
    match self {
      CompilationMode::Release => (
        CONFIG.compilers.gpp.clone(),
        s(&[
          "-std=c++17",
          "-static",
          "-O3",
          "-x",
          "c++",
          "-",
          "-lm",
          "-o",
          target,
        ]),
      ),
      CompilationMode::AnalyzeClang => (
        CONFIG.compilers.clangpp.clone(),
        s(&[
          "-std=c++14",
          "-Wall",
          "-Werror",
          "-O1",
          "-g",
          "-fsanitize=address",
          "-fno-omit-frame-pointer",
          "-x",
          "c++",
          "-",
          "-lm",
          "-o",
          target,
        ]),
      ),
      CompilationMode::AnalyzeGplusplus => (
        CONFIG.compilers.gpp.clone(),
        s(&[
          "-std=c++17",
          "-Wall",
          "-Werror",
          "-O1",
          "-g",
          "-fsanitize=address",
          "-fno-omit-frame-pointer",
          "-x",
          "c++",
          "-",
          "-lm",
          "-o",
          target,
        ]),
      ),
    }
  }

  /// Human-readable form of the command that would be run for this mode
  /// against a nominal `a.out` target, for UI display.
  pub fn display_command(&self) -> String {
    let (program, args) = self.command("a.out");
    std::iter::once(program)
      .chain(args)
      .collect::<Vec<_>>()
      .join(" ")
  }
}

/// Compiles `source` under `mode`, writing the resulting executable to
/// `target_executable_path`. Returns the combined stdout+stderr of the
/// compiler and whether compilation succeeded.
pub async fn compile(
  source: &[u8],
  mode: CompilationMode,
  target_executable_path: &str,
) -> Result<(Vec<u8>, bool), CompileError> {
  let (program, args) = mode.command(target_executable_path);

  let mut child = Command::new(&program)
    .args(&args)
    .stdin(Stdio::piped())
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .spawn()
    .map_err(CompileError::Spawn)?;

  {
    let mut stdin = child.stdin.take().expect("piped stdin");
    stdin.write_all(source).await.map_err(CompileError::Stdin)?;
    // Dropping here closes stdin so the compiler sees EOF.
  }

  let output = child.wait_with_output().await.map_err(CompileError::Wait)?;

  let mut combined = output.stdout;
  combined.extend_from_slice(&output.stderr);

  if !output.status.success() {
    let mut prefixed =
      format!("compilation failed with exit status {}\n", output.status).into_bytes();
    prefixed.extend_from_slice(&combined);
    return Ok((prefixed, false));
  }

  Ok((combined, true))
}
