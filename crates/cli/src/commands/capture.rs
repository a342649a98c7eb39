use std::path::Path;

use anyhow::{Context, Result};
use replay_core::config::AgentConfig;
use replay_core::pipeline::{CapturePipeline, ClassLoadHook, DumpReport};
use replay_core::store::FsArtifactStore;
use tracing::info;

use crate::commands::print_json;
use crate::read_class_inputs;

/// Feed every class under `input` through a capture session, then announce
/// exit and dump the corpus to `config.output_dir`.
pub fn capture_command(config: &AgentConfig, input: &Path, json: bool) -> Result<DumpReport> {
    let inputs = read_class_inputs(input)?;
    let pipeline = CapturePipeline::from_config(config);

    for class in &inputs {
        pipeline
            .on_class_load(None, &class.bytes)
            .with_context(|| format!("Failed to record {}", class.path.display()))?;
    }
    info!(events = inputs.len(), recorded = pipeline.recorded(), "replayed load events into capture");

    pipeline.notify_exit();
    let store = FsArtifactStore::new(&config.output_dir);
    let report = pipeline.dump(&store).context("Failed to dump capture session")?;

    if json {
        print_json(&report)?;
        return Ok(report);
    }

    println!("Capture summary:");
    println!("  Output: {}", config.output_dir.display());
    println!("  Recorded: {} ({} generated)", report.recorded, report.generated);
    if report.dry_run {
        println!("  Dry run: nothing written");
    } else {
        println!("  Created: {}", report.created);
        println!("  Overwritten: {}", report.overwritten);
    }
    for failure in report.format_failures.iter().chain(&report.io_failures) {
        println!("  Failed: {} ({})", failure.class, failure.error);
    }

    Ok(report)
}
