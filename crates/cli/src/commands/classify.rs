use anyhow::Result;
use replay_core::config::AgentConfig;
use replay_core::model::ToolingKind;
use serde::Serialize;

use crate::commands::{internal_name, print_json};

/// How the agent would treat one class name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameClassification {
    pub name: String,
    pub generated: bool,
    /// Run-independent prefix used in identifiers; only for generated names.
    pub stem: Option<String>,
    /// Set when the name belongs to the agent or one of its libraries.
    pub excluded: Option<ToolingKind>,
}

pub fn classify_names(config: &AgentConfig, names: &[String]) -> Vec<NameClassification> {
    let patterns = config.generated_patterns();
    let exclusions = config.exclusion_rules();
    names
        .iter()
        .map(|raw| {
            let name = internal_name(raw);
            NameClassification {
                generated: patterns.is_generated(&name),
                stem: patterns.stem(&name).map(str::to_string),
                excluded: exclusions.classify(&name),
                name,
            }
        })
        .collect()
}

pub fn classify_command(config: &AgentConfig, names: &[String], json: bool) -> Result<()> {
    let rows = classify_names(config, names);
    if json {
        return print_json(&rows);
    }

    for row in rows {
        let kind = match (row.excluded, row.generated) {
            (Some(ToolingKind::Agent), _) => "agent",
            (Some(ToolingKind::BytecodeLibrary), _) => "bytecode library",
            (None, true) => "generated",
            (None, false) => "ordinary",
        };
        match row.stem {
            Some(stem) => println!("{} [{}] stem={}", row.name, kind, stem),
            None => println!("{} [{}]", row.name, kind),
        }
    }
    Ok(())
}
