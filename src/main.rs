#[cfg(test)]
mod test;

pub mod args;
pub mod compile;
pub mod comparator;
pub mod error;
pub mod etc;
pub mod http;
pub mod submission;
pub mod testcase;

use std::error::Error;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::submission::processor::Processor;
use crate::submission::storage::{FsStorage, Storage};
use crate::testcase::archive::DirectoryArchive;

pub use crate::{args::ARGS, etc::CONFIG};

#[macro_use]
extern crate lazy_static;
extern crate log;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
  env_logger::init();

  let problems_root = ARGS.problems_root.clone().unwrap_or_else(|| CONFIG.problems_root.clone());
  let submissions_root = ARGS
    .submissions_root
    .clone()
    .unwrap_or_else(|| CONFIG.submissions_root.clone());
  let bind = ARGS.bind.clone().unwrap_or_else(|| CONFIG.bind.clone());

  let storage: Arc<dyn Storage> = Arc::new(FsStorage::new(&submissions_root));
  storage.init().await?;

  let archive = Arc::new(DirectoryArchive::new(&problems_root));
  let processor = Arc::new(Processor::new(storage.clone(), archive));

  let processor_loop = processor.clone();
  let worker = tokio::spawn(async move {
    if let Err(e) = processor_loop.process().await {
      log::error!("submission processor stopped: {e}");
    }
  });

  let state = http::AppState::new(storage, processor.clone());
  let app = http::routes(state);

  log::info!("listening on {bind}");
  let listener = TcpListener::bind(&bind).await?;
  axum::serve(listener, app).await?;

  processor.quit();
  worker.await?;
  Ok(())
}
