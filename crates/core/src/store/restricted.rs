use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::store::{read_optional, ArtifactLayout, ArtifactSource, StoreError};

/// Lookup of stored artifacts over a fixed list of corpus roots.
///
/// Roots are searched in order and nothing else is consulted, so a same-named
/// artifact from outside the captured corpus can never be picked up.
#[derive(Debug, Clone)]
pub struct RestrictedLookup {
    roots: Vec<ArtifactLayout>,
}

impl RestrictedLookup {
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        Self { roots: roots.into_iter().map(ArtifactLayout::new).collect() }
    }

    /// Roots from a platform path list (`:`-separated on Unix, `;` on Windows).
    /// Empty segments are dropped.
    pub fn from_path_list(list: impl AsRef<OsStr>) -> Self {
        Self::new(std::env::split_paths(list.as_ref()).filter(|p| !p.as_os_str().is_empty()))
    }

    pub fn roots(&self) -> impl Iterator<Item = &PathBuf> {
        self.roots.iter().map(|l| &l.root)
    }

    /// Roots that actually exist as directories.
    pub fn existing_roots(&self) -> Vec<&PathBuf> {
        self.roots().filter(|r| r.is_dir()).collect()
    }
}

impl ArtifactSource for RestrictedLookup {
    fn fetch(&self, name: &str) -> Result<Option<Vec<u8>>, StoreError> {
        for layout in &self.roots {
            let path = layout.path_for(name)?;
            if let Some(bytes) = read_optional(&path)? {
                trace!(artifact = name, path = %path.display(), "found stored artifact");
                return Ok(Some(bytes));
            }
        }
        Ok(None)
    }
}
