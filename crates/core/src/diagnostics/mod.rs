//! Per-event diagnostics records and pipeline counters.
//!
//! Sinks are best-effort: a sink that cannot write drops the record and logs at
//! debug level. It never fails or blocks the load event that produced it.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{SecondsFormat, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{DeclineReason, ToolingKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventOutcome {
    Replaced,
    Declined,
}

/// One diagnostics record per class-load event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadEvent {
    pub name: String,
    pub outcome: EventOutcome,
    /// Whether the bytes handed back differ from the runtime's.
    pub modified: bool,
    /// Empty for replaced classes.
    pub reason: String,
    /// RFC 3339 timestamp.
    pub at: String,
}

impl LoadEvent {
    pub fn replaced(name: impl Into<String>, modified: bool) -> Self {
        Self {
            name: name.into(),
            outcome: EventOutcome::Replaced,
            modified,
            reason: String::new(),
            at: now_rfc3339(),
        }
    }

    pub fn declined(name: impl Into<String>, reason: &DeclineReason) -> Self {
        Self {
            name: name.into(),
            outcome: EventOutcome::Declined,
            modified: false,
            reason: reason.as_str().to_string(),
            at: now_rfc3339(),
        }
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Append-only destination for [`LoadEvent`]s.
pub trait DiagnosticsSink: Send + Sync {
    fn record(&self, event: &LoadEvent);
}

/// Discards every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticsSink for NullSink {
    fn record(&self, _event: &LoadEvent) {}
}

/// Keeps records in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<LoadEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LoadEvent> {
        self.events.lock().clone()
    }
}

impl DiagnosticsSink for MemorySink {
    fn record(&self, event: &LoadEvent) {
        self.events.lock().push(event.clone());
    }
}

impl<T: DiagnosticsSink + ?Sized> DiagnosticsSink for std::sync::Arc<T> {
    fn record(&self, event: &LoadEvent) {
        (**self).record(event)
    }
}

/// Appends one JSON object per line to a file.
#[derive(Debug)]
pub struct JsonLinesSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonLinesSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf(), lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, event: &LoadEvent) -> std::io::Result<()> {
        let mut line = serde_json::to_string(event)?;
        line.push('\n');
        let _guard = self.lock.lock();
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(line.as_bytes())
    }
}

impl DiagnosticsSink for JsonLinesSink {
    fn record(&self, event: &LoadEvent) {
        if let Err(err) = self.append(event) {
            debug!(path = %self.path.display(), error = %err, "dropping diagnostics record");
        }
    }
}

/// Running counters of a substitution pipeline.
#[derive(Debug, Default)]
pub struct SubstitutionStats {
    invoked: AtomicU64,
    platform_java: AtomicU64,
    platform_sun: AtomicU64,
    replaced: AtomicU64,
    declined: AtomicU64,
    agent: AtomicU64,
    bytecode_library: AtomicU64,
    not_found: AtomicU64,
    unresolved: AtomicU64,
    io_failures: AtomicU64,
}

/// Point-in-time copy of [`SubstitutionStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstitutionSummary {
    pub invoked: u64,
    pub platform_java: u64,
    pub platform_sun: u64,
    pub replaced: u64,
    pub declined: u64,
    pub agent: u64,
    pub bytecode_library: u64,
    pub not_found: u64,
    pub unresolved: u64,
    pub io_failures: u64,
}

impl SubstitutionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn invoked(&self, name: &str) {
        self.invoked.fetch_add(1, Ordering::Relaxed);
        if name.starts_with("java/") {
            self.platform_java.fetch_add(1, Ordering::Relaxed);
        } else if name.starts_with("sun/") {
            self.platform_sun.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn replaced(&self) {
        self.replaced.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn declined(&self, reason: &DeclineReason) {
        self.declined.fetch_add(1, Ordering::Relaxed);
        let counter = match reason {
            DeclineReason::NotFound => &self.not_found,
            DeclineReason::ForeignTooling(ToolingKind::Agent) => &self.agent,
            DeclineReason::ForeignTooling(ToolingKind::BytecodeLibrary) => &self.bytecode_library,
            DeclineReason::UnresolvedReference => &self.unresolved,
            DeclineReason::Io => &self.io_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn summary(&self) -> SubstitutionSummary {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        SubstitutionSummary {
            invoked: load(&self.invoked),
            platform_java: load(&self.platform_java),
            platform_sun: load(&self.platform_sun),
            replaced: load(&self.replaced),
            declined: load(&self.declined),
            agent: load(&self.agent),
            bytecode_library: load(&self.bytecode_library),
            not_found: load(&self.not_found),
            unresolved: load(&self.unresolved),
            io_failures: load(&self.io_failures),
        }
    }
}
