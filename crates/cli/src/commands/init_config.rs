use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use replay_core::config::{AgentConfig, LOCAL_CONFIG_FILE};

use crate::canonicalize_or_current;

/// Write a default configuration file.
///
/// Without `path` the file is `class-replay.json` under `root`, where config
/// discovery looks first. An existing file is only replaced with `force`.
pub fn init_config_command(root: &str, path: Option<&str>, force: bool) -> Result<PathBuf> {
    let target = match path {
        Some(p) if Path::new(p).is_absolute() => PathBuf::from(p),
        Some(p) => canonicalize_or_current(root)?.join(p),
        None => canonicalize_or_current(root)?.join(LOCAL_CONFIG_FILE),
    };

    if target.exists() && !force {
        return Err(anyhow!(
            "Config already exists at {} (use --force to overwrite)",
            target.display()
        ));
    }
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let config = AgentConfig::default();
    config.save(&target)?;

    println!("Wrote default configuration:");
    println!("  Path: {}", target.display());
    println!("  Replay source: {}", config.source_path);
    println!("  Capture output: {}", config.output_dir.display());

    Ok(target)
}
