use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use class_replay::commands::{
    capture_command, classify_command, init_config_command, load_agent_config, replay_command,
    resolve_command,
};
use tracing::{debug, info};

/// Capture and replay the class files a JVM run loads.
///
/// This CLI is a thin host around `replay-core` (exposed in code as
/// `replay_core`): it reads class files from disk in load order and feeds them
/// through the same pipelines the runtime hook drives.
#[derive(Parser, Debug)]
#[command(
    name = "class-replay",
    version,
    about = "Capture and replay runtime-loaded class files",
    long_about = None
)]
struct Cli {
    /// Config file (JSON, or YAML by extension). Discovered when omitted.
    #[arg(long, global = true)]
    config: Option<String>,

    /// Debug-level logging on stderr.
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default configuration file.
    InitConfig {
        /// Directory to write `class-replay.json` into.
        #[arg(long, default_value = ".")]
        root: String,

        /// Explicit file path instead (YAML when it ends in .yaml/.yml).
        #[arg(long)]
        path: Option<String>,

        /// Replace an existing file.
        #[arg(long, default_value_t = false)]
        force: bool,
    },

    /// Show how class names are classified (generated, stem, excluded tooling).
    Classify {
        /// Class names, slash- or dot-separated.
        #[arg(required = true)]
        names: Vec<String>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Compute identifiers for the generated classes among a set of class files.
    Resolve {
        /// Directory of class files, or a manifest listing them in load order.
        #[arg(long)]
        input: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Record class files as one capture session and dump the corpus.
    Capture {
        /// Directory of class files, or a manifest listing them in load order.
        #[arg(long)]
        input: String,

        /// Corpus directory (overrides `output_dir`).
        #[arg(long)]
        output: Option<String>,

        /// Name and rewrite classes without writing anything.
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// Store generated classes under their own names.
        #[arg(long, default_value_t = false)]
        disable_canonicalization: bool,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Substitute stored class files for the given ones, as a replay session.
    Replay {
        /// Directory of class files, or a manifest listing them in load order.
        #[arg(long)]
        input: String,

        /// Corpus roots as a path list (overrides `source_path`).
        #[arg(long)]
        source: Option<String>,

        /// Write the bytes each class ends up with into this directory.
        #[arg(long)]
        output: Option<String>,

        /// Append per-class diagnostics records (JSON lines) to this file.
        #[arg(long)]
        diagnostics_log: Option<String>,

        /// Look generated classes up under their own names.
        #[arg(long, default_value_t = false)]
        disable_canonicalization: bool,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Command::InitConfig { root, path, force } = &cli.command {
        init_tracing(cli.verbose);
        init_config_command(root, path.as_deref(), *force)?;
        return Ok(());
    }

    let (mut config, config_path) = load_agent_config(cli.config.as_deref())?;
    init_tracing(cli.verbose || config.verbose);
    match &config_path {
        Some(path) => info!(config = %path.display(), "loaded configuration"),
        None => debug!("no configuration file found; using defaults"),
    }

    match cli.command {
        Command::InitConfig { .. } => {}
        Command::Classify { names, json } => classify_command(&config, &names, json)?,
        Command::Resolve { input, json } => resolve_command(&config, Path::new(&input), json)?,
        Command::Capture { input, output, dry_run, disable_canonicalization, json } => {
            if let Some(output) = output {
                config.output_dir = PathBuf::from(output);
            }
            config.dry_run |= dry_run;
            config.disable_canonicalization |= disable_canonicalization;
            capture_command(&config, Path::new(&input), json)?;
        }
        Command::Replay { input, source, output, diagnostics_log, disable_canonicalization, json } => {
            if let Some(source) = source {
                config.source_path = source;
            }
            if let Some(log) = diagnostics_log {
                config.diagnostics_log = Some(PathBuf::from(log));
            }
            config.disable_canonicalization |= disable_canonicalization;
            replay_command(&config, Path::new(&input), output.as_deref().map(Path::new), json)?;
        }
    }

    Ok(())
}
