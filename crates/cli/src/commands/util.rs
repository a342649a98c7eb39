use std::path::PathBuf;

use anyhow::{Context, Result};
use replay_core::config::{AgentConfig, ConfigError};
use serde::Serialize;

use crate::home_dir;

/// Load the config named on the command line, or discover one.
///
/// Returns the defaults and no path when discovery finds nothing; an explicit
/// path that cannot be read is an error.
pub fn load_agent_config(explicit: Option<&str>) -> Result<(AgentConfig, Option<PathBuf>)> {
    if let Some(path) = explicit {
        let path = PathBuf::from(path);
        let config = AgentConfig::load(&path)?;
        return Ok((config, Some(path)));
    }

    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let candidates = AgentConfig::candidate_paths(&cwd, home_dir().as_deref());
    match AgentConfig::discover(&candidates) {
        Ok((config, path)) => Ok((config, Some(path))),
        Err(err) if matches!(err.downcast_ref::<ConfigError>(), Some(ConfigError::NotFound(_))) => {
            Ok((AgentConfig::default(), None))
        }
        Err(err) => Err(err),
    }
}

/// Convert a dotted class name (`com.example.Main`) to its internal form.
pub fn internal_name(name: &str) -> String {
    name.replace('.', "/")
}

/// Pretty-print `value` as JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let serialized =
        serde_json::to_string_pretty(value).context("Failed to serialize output to JSON")?;
    println!("{}", serialized);
    Ok(())
}
