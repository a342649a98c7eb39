//! Persistent artifact storage.
//!
//! Artifacts are class files addressed by slash-delimited names (a literal
//! class name or a resolved identifier) and laid out as a file hierarchy.
//!
//! - `ArtifactLayout`: name -> path mapping.
//! - `FsArtifactStore`: read/write store used by the capture side.
//! - `RestrictedLookup`: read-only lookup over a fixed list of corpus roots,
//!   used by the substitution side.

pub mod layout;
pub mod restricted;

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use layout::{ArtifactLayout, ARTIFACT_EXTENSION};
pub use restricted::RestrictedLookup;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid artifact name '{0}'")]
    InvalidName(String),
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io { path: path.to_path_buf(), source }
    }
}

/// Whether `put` wrote a new artifact or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    Created,
    Overwritten,
}

/// Anything stored artifacts can be fetched from.
pub trait ArtifactSource: Send + Sync {
    /// Bytes stored under `name`, or `None` when there is no such artifact.
    fn fetch(&self, name: &str) -> Result<Option<Vec<u8>>, StoreError>;
}

/// Read the file at `path`, mapping "not found" to `None`.
pub(crate) fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, StoreError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(StoreError::io(path, err)),
    }
}

/// File-hierarchy artifact store rooted at one directory.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    layout: ArtifactLayout,
}

impl FsArtifactStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self { layout: ArtifactLayout::new(root) }
    }

    pub fn layout(&self) -> &ArtifactLayout {
        &self.layout
    }

    /// Write `bytes` under `name`, creating package directories as needed.
    pub fn put(&self, name: &str, bytes: &[u8]) -> Result<PutOutcome, StoreError> {
        let path = self.layout.path_for(name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        let outcome = if path.exists() { PutOutcome::Overwritten } else { PutOutcome::Created };
        fs::write(&path, bytes).map_err(|e| StoreError::io(&path, e))?;
        Ok(outcome)
    }

    pub fn get(&self, name: &str) -> Result<Option<Vec<u8>>, StoreError> {
        read_optional(&self.layout.path_for(name)?)
    }
}

impl ArtifactSource for FsArtifactStore {
    fn fetch(&self, name: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.get(name)
    }
}
