use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

pub mod commands;

/// Canonicalize the root path if possible, falling back to the given string
/// relative to the current working directory.
pub fn canonicalize_or_current(root: &str) -> Result<PathBuf> {
    let path = Path::new(root);
    if path == Path::new(".") {
        Ok(env::current_dir().context("Failed to get current directory")?)
    } else {
        // Try to canonicalize; if it fails (e.g., path does not yet exist),
        // join it with the current dir to get an absolute path.
        match path.canonicalize() {
            Ok(p) => Ok(p),
            Err(_) => {
                let cwd = env::current_dir().context("Failed to get current directory")?;
                Ok(cwd.join(path))
            }
        }
    }
}

/// The user's home directory, if the environment names one.
pub fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME").or_else(|| env::var_os("USERPROFILE")).map(PathBuf::from)
}

/// One class file to feed through a pipeline, in load order.
#[derive(Debug, Clone)]
pub struct ClassInput {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

/// Read the class files named by `input` in load order.
///
/// `input` is either a directory, walked recursively with `.class` files
/// sorted by relative path, or a manifest listing one class file per line
/// (relative to the manifest; blank lines and `#` comments skipped).
pub fn read_class_inputs(input: &Path) -> Result<Vec<ClassInput>> {
    let paths = if input.is_dir() {
        let mut found = Vec::new();
        collect_class_files(input, &mut found)?;
        found.sort();
        found
    } else if input.is_file() {
        read_manifest(input)?
    } else {
        return Err(anyhow!("Input does not exist: {}", input.display()));
    };

    paths
        .into_iter()
        .map(|path| {
            let bytes = fs::read(&path)
                .with_context(|| format!("Failed to read class file {}", path.display()))?;
            Ok(ClassInput { path, bytes })
        })
        .collect()
}

fn collect_class_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in
        fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            collect_class_files(&path, out)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some("class") {
            out.push(path);
        }
    }
    Ok(())
}

fn read_manifest(manifest: &Path) -> Result<Vec<PathBuf>> {
    let body = fs::read_to_string(manifest)
        .with_context(|| format!("Failed to read manifest {}", manifest.display()))?;
    let base = manifest.parent().unwrap_or_else(|| Path::new("."));
    Ok(body
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            let path = Path::new(line);
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                base.join(path)
            }
        })
        .collect())
}
