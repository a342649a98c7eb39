//! Core data model: observed classes, naming records, and load-event outcomes.

use serde::{Deserialize, Serialize};

/// A class as the runtime delivered it during this session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryClass {
    /// Name under which the runtime loaded the class. Run-specific for
    /// generated classes.
    pub logical_name: String,
    pub bytes: Vec<u8>,
    /// Position in the session's load order, starting at 0.
    pub load_order: u64,
}

impl BinaryClass {
    pub fn new(logical_name: impl Into<String>, bytes: Vec<u8>, load_order: u64) -> Self {
        Self { logical_name: logical_name.into(), bytes, load_order }
    }
}

/// Naming result for one generated class.
///
/// Created the first time an identifier is requested and never changed
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedClassRecord {
    pub logical_name: String,
    /// Content-derived, run-independent name.
    pub identifier: String,
    /// Original bytes with the class's own name and every referenced generated
    /// class renamed to their identifiers; this is what gets persisted.
    pub rewritten_bytes: Vec<u8>,
    /// Generated classes this one references, as named in this run, in pool
    /// order.
    pub referenced_names: Vec<String>,
    /// Identifiers of those classes, in the same order.
    pub referenced_identifiers: Vec<String>,
    /// SHA-256 of the original bytes, used to detect divergent re-observations.
    pub source_digest: String,
}

/// Which of our own dependencies a foreign-tooling class belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolingKind {
    /// The agent's own classes.
    Agent,
    /// A bytecode library the agent depends on.
    BytecodeLibrary,
}

/// Why the runtime keeps its own bytes for a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclineReason {
    NotFound,
    ForeignTooling(ToolingKind),
    /// A referenced generated class has not been loaded in this run.
    UnresolvedReference,
    Io,
}

impl DeclineReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclineReason::NotFound => "NotFound",
            DeclineReason::ForeignTooling(ToolingKind::Agent) => "Agent",
            DeclineReason::ForeignTooling(ToolingKind::BytecodeLibrary) => "BytecodeLibrary",
            DeclineReason::UnresolvedReference => "UnresolvedReference",
            DeclineReason::Io => "IOFailure",
        }
    }
}

impl std::fmt::Display for DeclineReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of handling one class-load event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Hand these bytes to the runtime instead of its own.
    Replaced(Vec<u8>),
    /// Keep the runtime's bytes.
    Declined(DeclineReason),
}

impl LoadOutcome {
    /// Bytes for the runtime hook: `None` means "use your own bytes".
    pub fn into_replacement(self) -> Option<Vec<u8>> {
        match self {
            LoadOutcome::Replaced(bytes) => Some(bytes),
            LoadOutcome::Declined(_) => None,
        }
    }
}
