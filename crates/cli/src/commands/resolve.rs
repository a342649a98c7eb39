use std::path::Path;

use anyhow::{Context, Result};
use replay_core::classfile::extract_declared_name;
use replay_core::config::AgentConfig;
use replay_core::normalizer::Namer;
use replay_core::session::SessionState;
use serde::Serialize;

use crate::commands::print_json;
use crate::{read_class_inputs, ClassInput};

/// Identifier resolution result for one input class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedClass {
    pub name: String,
    pub generated: bool,
    pub identifier: Option<String>,
    pub error: Option<String>,
}

/// Name every generated class among `inputs` the way a capture dump would:
/// all classes are retained first, then generated ones are resolved in order.
pub fn resolve_inputs(config: &AgentConfig, inputs: &[ClassInput]) -> Result<Vec<ResolvedClass>> {
    let mut namer = Namer::new(config.generated_patterns());
    if config.disable_canonicalization {
        namer = namer.without_canonicalization();
    }
    let mut session = SessionState::new(namer);

    let mut names = Vec::with_capacity(inputs.len());
    for input in inputs {
        let name = extract_declared_name(&input.bytes)
            .with_context(|| format!("Failed to read class name from {}", input.path.display()))?;
        session.retained.retain(&name, &input.bytes);
        names.push(name);
    }

    Ok(names
        .into_iter()
        .map(|name| {
            if !session.namer.patterns().is_generated(&name) {
                return ResolvedClass { name, generated: false, identifier: None, error: None };
            }
            match session.resolve(&name) {
                Ok(record) => ResolvedClass {
                    identifier: Some(record.identifier.clone()),
                    name,
                    generated: true,
                    error: None,
                },
                Err(err) => ResolvedClass {
                    name,
                    generated: true,
                    identifier: None,
                    error: Some(err.to_string()),
                },
            }
        })
        .collect())
}

pub fn resolve_command(config: &AgentConfig, input: &Path, json: bool) -> Result<()> {
    let inputs = read_class_inputs(input)?;
    let resolved = resolve_inputs(config, &inputs)?;
    if json {
        return print_json(&resolved);
    }

    println!("Classes ({}):", resolved.len());
    for class in resolved {
        match (class.identifier, class.error) {
            (Some(identifier), _) => println!("  - {} -> {}", class.name, identifier),
            (None, Some(error)) => println!("  - {} [unresolved: {}]", class.name, error),
            (None, None) => println!("  - {}", class.name),
        }
    }
    Ok(())
}
