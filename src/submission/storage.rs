//! Durable, concurrently-accessible mapping `ID -> Metadata` (§4.5).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::Mutex;

use super::metadata::{Metadata, SubmissionId};

const META_EXTENSION: &str = ".meta";

#[derive(Debug, Error)]
pub enum StorageError {
  #[error("unable to create directory '{0}': {1}")]
  CreateDir(PathBuf, #[source] std::io::Error),

  #[error("unable to write solution file '{0}': {1}")]
  WriteSolution(PathBuf, #[source] std::io::Error),

  #[error("unable to open solution file '{0}': {1}")]
  OpenSolution(PathBuf, #[source] std::io::Error),

  #[error("unable to write metadata file '{0}': {1}")]
  WriteMetadata(PathBuf, #[source] std::io::Error),

  #[error("unable to serialize metadata: {0}")]
  Serialize(#[source] serde_json::Error),

  #[error("unable to read metadata directory '{0}': {1}")]
  ReadDir(PathBuf, #[source] std::io::Error),

  #[error("unable to read metadata file '{0}': {1}")]
  ReadMetadata(PathBuf, #[source] std::io::Error),

  #[error("malformed metadata file '{0}': {1}")]
  Decode(PathBuf, #[source] serde_json::Error),

  #[error("unable to remove metadata file '{0}': {1}")]
  Remove(PathBuf, #[source] std::io::Error),

  #[error("unable to destroy storage root '{0}': {1}")]
  Destroy(PathBuf, #[source] std::io::Error),
}

/// Durable mapping `ID -> Metadata`, plus an object store for solution
/// source files. All operations are safe under concurrent calls.
#[async_trait]
pub trait Storage: Send + Sync {
  async fn init(&self) -> Result<(), StorageError>;
  async fn upload(&self, meta: Metadata, source: &[u8]) -> Result<(), StorageError>;
  async fn download(&self, meta: &Metadata) -> Result<Vec<u8>, StorageError>;
  async fn save(&self, meta: Metadata) -> Result<(), StorageError>;
  async fn get(&self, id: SubmissionId) -> Option<Metadata>;
  async fn remove(&self, id: SubmissionId) -> Result<(), StorageError>;
  async fn list(&self) -> Vec<Metadata>;
  async fn load_all(&self) -> Result<(), StorageError>;
  async fn destroy(&self) -> Result<(), StorageError>;
}

/// Filesystem-backed storage: an in-memory map guarded by a mutex, mirrored
/// to `<root>/<id>.meta` JSON files and `<root>/<problem>/<solution>` source
/// files.
pub struct FsStorage {
  data: Mutex<HashMap<SubmissionId, Metadata>>,
  root: PathBuf,
}

impl FsStorage {
  pub fn new(root: impl AsRef<Path>) -> Self {
    Self {
      data: Mutex::new(HashMap::new()),
      root: root.as_ref().to_path_buf(),
    }
  }

  fn meta_path(&self, id: SubmissionId) -> PathBuf {
    self.root.join(format!("{id}{META_EXTENSION}"))
  }

  fn solution_path(&self, meta: &Metadata) -> PathBuf {
    self
      .root
      .join(&meta.problem_name)
      .join(&meta.solution_filename)
  }
}

async fn ensure_dir(dir: &Path) -> Result<(), StorageError> {
  if fs::metadata(dir).await.is_err() {
    fs::create_dir_all(dir)
      .await
      .map_err(|e| StorageError::CreateDir(dir.to_path_buf(), e))?;
  }
  Ok(())
}

#[async_trait]
impl Storage for FsStorage {
  async fn init(&self) -> Result<(), StorageError> {
    ensure_dir(&self.root).await
  }

  async fn upload(&self, meta: Metadata, source: &[u8]) -> Result<(), StorageError> {
    let solutions_dir = self.root.join(&meta.problem_name);
    ensure_dir(&solutions_dir).await?;

    let solution_path = self.solution_path(&meta);
    let mut file = fs::File::create(&solution_path)
      .await
      .map_err(|e| StorageError::WriteSolution(solution_path.clone(), e))?;
    file
      .write_all(source)
      .await
      .map_err(|e| StorageError::WriteSolution(solution_path.clone(), e))?;

    // The save only happens once the copy above has fully succeeded, so a
    // failed upload never leaves a dangling Save behind (§4.5).
    self.save(meta).await
  }

  async fn download(&self, meta: &Metadata) -> Result<Vec<u8>, StorageError> {
    let path = self.solution_path(meta);
    let mut file = fs::File::open(&path)
      .await
      .map_err(|e| StorageError::OpenSolution(path.clone(), e))?;
    let mut buf = Vec::new();
    file
      .read_to_end(&mut buf)
      .await
      .map_err(|e| StorageError::OpenSolution(path, e))?;
    Ok(buf)
  }

  async fn save(&self, meta: Metadata) -> Result<(), StorageError> {
    let path = self.meta_path(meta.id);
    let encoded =
      serde_json::to_vec_pretty(&meta).map_err(StorageError::Serialize)?;

    // Hold the lock across the write so that once `save` returns, any
    // subsequent `get` on any task sees exactly this Metadata (§4.5).
    let mut data = self.data.lock().await;
    let mut file = fs::File::create(&path)
      .await
      .map_err(|e| StorageError::WriteMetadata(path.clone(), e))?;
    file
      .write_all(&encoded)
      .await
      .map_err(|e| StorageError::WriteMetadata(path, e))?;
    data.insert(meta.id, meta);
    Ok(())
  }

  async fn get(&self, id: SubmissionId) -> Option<Metadata> {
    self.data.lock().await.get(&id).cloned()
  }

  async fn remove(&self, id: SubmissionId) -> Result<(), StorageError> {
    let path = self.meta_path(id);
    let mut data = self.data.lock().await;
    data.remove(&id);
    match fs::remove_file(&path).await {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
      Err(e) => Err(StorageError::Remove(path, e)),
    }
  }

  async fn list(&self) -> Vec<Metadata> {
    let data = self.data.lock().await;
    let mut all: Vec<Metadata> = data.values().cloned().collect();
    all.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
    all
  }

  async fn load_all(&self) -> Result<(), StorageError> {
    let mut entries = fs::read_dir(&self.root)
      .await
      .map_err(|e| StorageError::ReadDir(self.root.clone(), e))?;

    let mut loaded = HashMap::new();
    while let Some(entry) = entries
      .next_entry()
      .await
      .map_err(|e| StorageError::ReadDir(self.root.clone(), e))?
    {
      let path = entry.path();
      let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        continue;
      };
      if !name.ends_with(META_EXTENSION) {
        continue;
      }

      let mut file = fs::File::open(&path)
        .await
        .map_err(|e| StorageError::ReadMetadata(path.clone(), e))?;
      let mut buf = Vec::new();
      file
        .read_to_end(&mut buf)
        .await
        .map_err(|e| StorageError::ReadMetadata(path.clone(), e))?;

      let meta: Metadata =
        serde_json::from_slice(&buf).map_err(|e| StorageError::Decode(path, e))?;
      loaded.insert(meta.id, meta);
    }

    let count = loaded.len();
    *self.data.lock().await = loaded;
    log::info!("loaded {count} submissions into memory");
    Ok(())
  }

  async fn destroy(&self) -> Result<(), StorageError> {
    match fs::remove_dir_all(&self.root).await {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
      Err(e) => Err(StorageError::Destroy(self.root.clone(), e)),
    }
  }
}

pub type SharedStorage = Arc<dyn Storage>;
