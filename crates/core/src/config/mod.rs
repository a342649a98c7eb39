//! Agent configuration, read once at startup.
//!
//! Config files are JSON, or YAML when the extension is `.yaml`/`.yml`.
//! [`AgentConfig::discover`] looks for `class-replay.json` in the working
//! directory first and then for `~/.class-replay/config.json`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::normalizer::GeneratedNamePatterns;
use crate::pipeline::ExclusionRules;
use crate::store::RestrictedLookup;

/// Config file name looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "class-replay.json";
/// Per-user config directory under the home directory.
pub const USER_CONFIG_DIR: &str = ".class-replay";
/// Config file name inside [`USER_CONFIG_DIR`].
pub const USER_CONFIG_FILE: &str = "config.json";

/// Startup errors that must stop the process before any pipeline runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no configuration file found (searched: {})", display_paths(.0))]
    NotFound(Vec<PathBuf>),

    #[error("no usable replay source: none of [{}] is a directory", display_paths(.0))]
    MissingSource(Vec<PathBuf>),

    #[error("replay source path is empty")]
    EmptySource,
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", ")
}

fn default_source_path() -> String {
    "out".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("out")
}

fn default_agent_prefixes() -> Vec<String> {
    vec!["dev/classreplay/".to_string()]
}

fn default_library_prefixes() -> Vec<String> {
    vec!["org/objectweb/asm/".to_string()]
}

/// Serializable configuration shared by the capture and replay sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Emit per-class diagnostics and debug-level logging.
    #[serde(default)]
    pub verbose: bool,
    /// Use logical names as identifiers instead of content hashes.
    #[serde(default)]
    pub disable_canonicalization: bool,
    /// Replay corpus roots, as a platform path list.
    #[serde(default = "default_source_path")]
    pub source_path: String,
    /// Capture output directory.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Capture: name and rewrite classes but write nothing.
    #[serde(default)]
    pub dry_run: bool,
    /// Name fragments marking generated classes, on top of the defaults.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_generated_patterns: Vec<String>,
    /// Package prefixes of the agent's own classes (slash-separated).
    #[serde(default = "default_agent_prefixes")]
    pub agent_prefixes: Vec<String>,
    /// Package prefixes of bytecode libraries the agent depends on.
    #[serde(default = "default_library_prefixes")]
    pub library_prefixes: Vec<String>,
    /// Append per-event diagnostics records (JSON lines) here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostics_log: Option<PathBuf>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            disable_canonicalization: false,
            source_path: default_source_path(),
            output_dir: default_output_dir(),
            dry_run: false,
            extra_generated_patterns: Vec::new(),
            agent_prefixes: default_agent_prefixes(),
            library_prefixes: default_library_prefixes(),
            diagnostics_log: None,
        }
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(path.extension().and_then(|e| e.to_str()), Some("yaml" | "yml"))
}

impl AgentConfig {
    /// Load a config file (JSON, or YAML by extension).
    pub fn load(path: &Path) -> Result<Self> {
        let body = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        let config = if is_yaml(path) {
            serde_yaml::from_str(&body)
                .with_context(|| format!("Failed to parse YAML config {}", path.display()))?
        } else {
            serde_json::from_str(&body)
                .with_context(|| format!("Failed to parse JSON config {}", path.display()))?
        };
        Ok(config)
    }

    /// Write the config, choosing the format from the extension.
    pub fn save(&self, path: &Path) -> Result<()> {
        let body = if is_yaml(path) {
            serde_yaml::to_string(self).context("Failed to serialize config as YAML")?
        } else {
            serde_json::to_string_pretty(self).context("Failed to serialize config as JSON")?
        };
        std::fs::write(path, body)
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    /// Default search locations, most specific first.
    pub fn candidate_paths(working_dir: &Path, home: Option<&Path>) -> Vec<PathBuf> {
        let mut candidates = vec![working_dir.join(LOCAL_CONFIG_FILE)];
        if let Some(home) = home {
            candidates.push(home.join(USER_CONFIG_DIR).join(USER_CONFIG_FILE));
        }
        candidates
    }

    /// Load the first readable candidate.
    pub fn discover(candidates: &[PathBuf]) -> Result<(Self, PathBuf)> {
        let found = candidates.iter().find(|p| p.is_file());
        let Some(path) = found else {
            return Err(ConfigError::NotFound(candidates.to_vec()).into());
        };
        Ok((Self::load(path)?, path.clone()))
    }

    pub fn generated_patterns(&self) -> GeneratedNamePatterns {
        let mut patterns = GeneratedNamePatterns::default();
        patterns.extend(self.extra_generated_patterns.iter().cloned());
        patterns
    }

    pub fn exclusion_rules(&self) -> ExclusionRules {
        ExclusionRules::new(self.agent_prefixes.clone(), self.library_prefixes.clone())
    }

    /// Lookup over `source_path`, failing when none of its roots exists.
    pub fn replay_lookup(&self) -> Result<RestrictedLookup, ConfigError> {
        if self.source_path.trim().is_empty() {
            return Err(ConfigError::EmptySource);
        }
        let lookup = RestrictedLookup::from_path_list(&self.source_path);
        if lookup.existing_roots().is_empty() {
            return Err(ConfigError::MissingSource(lookup.roots().cloned().collect()));
        }
        Ok(lookup)
    }
}
