use clap::Parser;

/// Command line args.
#[derive(Parser, Debug)]
#[clap(version, about = "Automated judge for competitive-programming submissions.", long_about = None)]
pub struct Args {
  /// Extra config file search paths, checked after the built-in defaults.
  #[clap(short, long, value_parser)]
  pub config_search_path: Vec<String>,

  /// Directory holding per-problem test case data (`<problem>/<name>.in|.out`).
  #[clap(long, value_parser)]
  pub problems_root: Option<String>,

  /// Directory holding durable submission metadata and uploaded sources.
  #[clap(long, value_parser)]
  pub submissions_root: Option<String>,

  /// Address for the HTTP API to listen on.
  #[clap(long, value_parser)]
  pub bind: Option<String>,
}

lazy_static! {
  /// Parsed command line args.
  pub static ref ARGS: Args = Args::parse();
}
