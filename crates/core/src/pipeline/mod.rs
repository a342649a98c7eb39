//! Event pipelines driven by the runtime's class-load hook.
//!
//! - `capture`: records every loaded class and writes the corpus at exit.
//! - `substitution`: answers each load event with stored bytes, renamed to
//!   what the current run expects.

pub mod capture;
pub mod substitution;

use thiserror::Error;

use crate::classfile::{extract_declared_name, FormatError};
use crate::model::ToolingKind;
use crate::normalizer::NamingError;

pub use capture::{CaptureError, CapturePipeline, CaptureState, DumpFailure, DumpReport};
pub use substitution::SubstitutionPipeline;

/// Errors surfaced to the runtime hook. Expected gaps are never errors; these
/// all mean the input or the corpus breaks an invariant.
#[derive(Debug, Error)]
pub enum HookError {
    #[error("malformed class {class}: {source}")]
    Format {
        class: String,
        #[source]
        source: FormatError,
    },

    #[error("cannot name generated class {class}: {source}")]
    Naming {
        class: String,
        #[source]
        source: NamingError,
    },
}

impl HookError {
    pub fn format(class: &str, source: FormatError) -> Self {
        HookError::Format { class: class.to_string(), source }
    }
}

/// The runtime's class-load callback.
///
/// `name` may be absent, in which case it is read from `bytes`. Returning
/// `Ok(None)` tells the runtime to keep its own bytes.
pub trait ClassLoadHook: Send + Sync {
    fn on_class_load(&self, name: Option<&str>, bytes: &[u8])
        -> Result<Option<Vec<u8>>, HookError>;
}

/// The event's class name, taken from the class file when the runtime gave none.
pub fn event_name(name: Option<&str>, bytes: &[u8]) -> Result<String, HookError> {
    match name {
        Some(name) => Ok(name.to_string()),
        None => extract_declared_name(bytes).map_err(|e| HookError::format("<unnamed>", e)),
    }
}

/// Package prefixes whose classes must never be captured or substituted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionRules {
    agent_prefixes: Vec<String>,
    library_prefixes: Vec<String>,
}

impl ExclusionRules {
    pub fn new(agent_prefixes: Vec<String>, library_prefixes: Vec<String>) -> Self {
        Self { agent_prefixes, library_prefixes }
    }

    /// Which kind of foreign tooling `name` belongs to, if any.
    pub fn classify(&self, name: &str) -> Option<ToolingKind> {
        let matches = |prefixes: &[String]| prefixes.iter().any(|p| name.starts_with(p.as_str()));
        if matches(&self.agent_prefixes) {
            Some(ToolingKind::Agent)
        } else if matches(&self.library_prefixes) {
            Some(ToolingKind::BytecodeLibrary)
        } else {
            None
        }
    }
}
