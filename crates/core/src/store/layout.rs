use std::path::{Path, PathBuf};

use crate::store::StoreError;

/// File extension of stored artifacts.
pub const ARTIFACT_EXTENSION: &str = "class";

/// Mapping from slash-delimited artifact names to files under a root.
///
/// `com/sun/proxy/$Proxy$HASHED$ab12` lives at
/// `<root>/com/sun/proxy/$Proxy$HASHED$ab12.class`. This does not touch the
/// filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    pub root: PathBuf,
}

impl ArtifactLayout {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    /// Path of the artifact stored under `name`.
    ///
    /// Rejects names that could leave the root: empty names, leading slashes,
    /// empty, `.` or `..` segments, and backslashes.
    pub fn path_for(&self, name: &str) -> Result<PathBuf, StoreError> {
        let invalid = || StoreError::InvalidName(name.to_string());
        if name.is_empty() || name.contains('\\') || name.contains('\0') {
            return Err(invalid());
        }
        let mut path = self.root.clone();
        let mut segments = name.split('/').peekable();
        while let Some(segment) = segments.next() {
            if segment.is_empty() || segment == "." || segment == ".." {
                return Err(invalid());
            }
            if segments.peek().is_some() {
                path.push(segment);
            } else {
                path.push(format!("{segment}.{ARTIFACT_EXTENSION}"));
            }
        }
        Ok(path)
    }
}
