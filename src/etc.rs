use serde::{Deserialize, Serialize};

use crate::ARGS;

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
/// Judge server config.
pub struct Cfg {
  /// Address for the HTTP API to listen on.
  pub bind: String,

  /// Directory holding per-problem test case data (`<problem>/<name>.in|.out`).
  pub problems_root: String,

  /// Directory holding durable submission metadata and uploaded sources.
  pub submissions_root: String,

  /// Compiler binaries used by the compiler driver, keyed by compilation mode.
  pub compilers: CompilerCfg,

  /// Worker count used for a submission when the caller does not override it.
  /// `None` means "half the host CPU count, minimum 1" as specified.
  pub default_worker_count: Option<usize>,
}

impl Default for Cfg {
  fn default() -> Self {
    return Self {
      bind: "0.0.0.0:8080".to_string(),
      problems_root: "./problems".to_string(),
      submissions_root: "./submissions".to_string(),
      compilers: CompilerCfg::default(),
      default_worker_count: None,
    };
  }
}

/// Paths to the compiler binaries invoked by the compiler driver (§4.2).
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct CompilerCfg {
  pub gpp: String,
  pub clangpp: String,
}

impl Default for CompilerCfg {
  fn default() -> Self {
    return Self {
      gpp: "g++".to_string(),
      clangpp: "clang++".to_string(),
    };
  }
}

impl Cfg {
  /// Create and load the config from the built-in defaults, an optional
  /// system-wide file, any caller-provided search paths, and the
  /// environment (prefix `INOUT_JUDGE_`), in that order of increasing
  /// priority.
  pub fn load(search_paths: &Vec<String>) -> Self {
    let mut builder = config::Config::builder()
      .add_source(config::File::with_name("/etc/inout-judge/config").required(false));

    for p in search_paths {
      builder = builder.add_source(config::File::with_name(p.as_str()).required(false));
    }

    builder = builder.add_source(config::Environment::with_prefix("INOUT_JUDGE"));

    return builder.build().unwrap().try_deserialize::<Self>().unwrap();
  }
}

lazy_static! {
  /// Global config.
  pub static ref CONFIG: Cfg = Cfg::load(&ARGS.config_search_path);
}
