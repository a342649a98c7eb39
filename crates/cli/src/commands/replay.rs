use std::path::Path;

use anyhow::{anyhow, Context, Result};
use replay_core::config::AgentConfig;
use replay_core::diagnostics::SubstitutionSummary;
use replay_core::model::LoadOutcome;
use replay_core::pipeline::{event_name, SubstitutionPipeline};
use replay_core::store::FsArtifactStore;
use serde::Serialize;
use tracing::error;

use crate::commands::print_json;
use crate::{read_class_inputs, ClassInput};

/// What happened to one class during a replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayedClass {
    pub name: String,
    /// `replaced`, `declined` or `error`.
    pub outcome: String,
    pub modified: bool,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    pub classes: Vec<ReplayedClass>,
    pub stats: SubstitutionSummary,
    pub errors: usize,
}

/// Run `inputs` through a substitution session built from `config`.
///
/// With `output`, the bytes the runtime would end up loading (stored bytes
/// when replaced, its own otherwise) are written there under each class name.
pub fn replay_inputs(
    config: &AgentConfig,
    inputs: &[ClassInput],
    output: Option<&Path>,
) -> Result<ReplaySummary> {
    let pipeline = SubstitutionPipeline::from_config(config)?;
    let store = output.map(FsArtifactStore::new);

    let mut classes = Vec::with_capacity(inputs.len());
    let mut errors = 0;
    for input in inputs {
        let name = match event_name(None, &input.bytes) {
            Ok(name) => name,
            Err(err) => {
                error!(path = %input.path.display(), error = %err, "unreadable class file");
                errors += 1;
                classes.push(ReplayedClass {
                    name: input.path.display().to_string(),
                    outcome: "error".into(),
                    modified: false,
                    detail: Some(err.to_string()),
                });
                continue;
            }
        };

        let (entry, loaded) = match pipeline.handle(&name, &input.bytes) {
            Ok(LoadOutcome::Replaced(bytes)) => {
                let entry = ReplayedClass {
                    name: name.clone(),
                    outcome: "replaced".into(),
                    modified: bytes != input.bytes,
                    detail: None,
                };
                (entry, bytes)
            }
            Ok(LoadOutcome::Declined(reason)) => {
                let entry = ReplayedClass {
                    name: name.clone(),
                    outcome: "declined".into(),
                    modified: false,
                    detail: Some(reason.to_string()),
                };
                (entry, input.bytes.clone())
            }
            Err(err) => {
                errors += 1;
                let entry = ReplayedClass {
                    name: name.clone(),
                    outcome: "error".into(),
                    modified: false,
                    detail: Some(err.to_string()),
                };
                (entry, input.bytes.clone())
            }
        };

        if let Some(store) = &store {
            store
                .put(&name, &loaded)
                .with_context(|| format!("Failed to write loaded bytes of {name}"))?;
        }
        classes.push(entry);
    }

    Ok(ReplaySummary { classes, stats: pipeline.stats(), errors })
}

pub fn replay_command(
    config: &AgentConfig,
    input: &Path,
    output: Option<&Path>,
    json: bool,
) -> Result<ReplaySummary> {
    let inputs = read_class_inputs(input)?;
    let summary = replay_inputs(config, &inputs, output)?;

    if json {
        print_json(&summary)?;
    } else {
        println!("Replay summary:");
        println!("  Source: {}", config.source_path);
        println!("  Invoked: {}", summary.stats.invoked);
        println!("  Replaced: {}", summary.stats.replaced);
        println!("  Declined: {}", summary.stats.declined);
        for class in &summary.classes {
            match &class.detail {
                Some(detail) => println!("  - {} [{}] {}", class.name, class.outcome, detail),
                None => println!("  - {} [{}]", class.name, class.outcome),
            }
        }
    }

    if summary.errors > 0 {
        return Err(anyhow!("{} class(es) could not be substituted", summary.errors));
    }
    Ok(summary)
}
