use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::AgentConfig;
use crate::model::ToolingKind;
use crate::normalizer::{Namer, NamingError};
use crate::pipeline::{event_name, ClassLoadHook, ExclusionRules, HookError};
use crate::session::{RetainOutcome, SessionState};
use crate::store::{FsArtifactStore, PutOutcome};

/// Lifecycle of a capture session. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureState {
    /// Recording load events.
    Running,
    /// The host announced exit; new events are ignored.
    ShuttingDown,
    /// The corpus has been written.
    Dumped,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CaptureError {
    #[error("cannot dump while the session is still running")]
    StillRunning,
    #[error("the session has already been dumped")]
    AlreadyDumped,
}

/// A class the dump could not write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DumpFailure {
    pub class: String,
    pub error: String,
}

/// What a dump did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DumpReport {
    /// Classes recorded during the session.
    pub recorded: usize,
    /// How many of them were generated classes.
    pub generated: usize,
    /// Artifacts written to previously empty paths.
    pub created: usize,
    /// Artifacts that replaced an existing file.
    pub overwritten: usize,
    /// Set when nothing was written on purpose.
    pub dry_run: bool,
    pub io_failures: Vec<DumpFailure>,
    /// Classes whose bytes are malformed or could not be named.
    pub format_failures: Vec<DumpFailure>,
    /// Load events dropped because they arrived after the exit notification.
    pub ignored_after_exit: u64,
}

struct CaptureInner {
    state: CaptureState,
    session: SessionState,
    ignored_after_exit: u64,
}

/// Play-out side: records classes in load order and writes them at exit,
/// generated classes under their resolved identifiers.
pub struct CapturePipeline {
    exclusions: ExclusionRules,
    dry_run: bool,
    inner: Mutex<CaptureInner>,
}

impl CapturePipeline {
    pub fn new(namer: Namer, exclusions: ExclusionRules) -> Self {
        Self {
            exclusions,
            dry_run: false,
            inner: Mutex::new(CaptureInner {
                state: CaptureState::Running,
                session: SessionState::new(namer),
                ignored_after_exit: 0,
            }),
        }
    }

    pub fn from_config(config: &AgentConfig) -> Self {
        let mut namer = Namer::new(config.generated_patterns());
        if config.disable_canonicalization {
            namer = namer.without_canonicalization();
        }
        Self::new(namer, config.exclusion_rules()).with_dry_run(config.dry_run)
    }

    /// Name and rewrite classes at dump time but do not write them.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn state(&self) -> CaptureState {
        self.inner.lock().state
    }

    /// Number of distinct classes recorded so far.
    pub fn recorded(&self) -> usize {
        self.inner.lock().session.retained.len()
    }

    /// Record one load event. Returns `None` when the event was not recorded
    /// (agent class, or the session is no longer running).
    pub fn record(&self, name: &str, bytes: &[u8]) -> Option<RetainOutcome> {
        if self.exclusions.classify(name) == Some(ToolingKind::Agent) {
            return None;
        }
        let mut inner = self.inner.lock();
        if inner.state != CaptureState::Running {
            inner.ignored_after_exit += 1;
            debug!(class = name, "ignoring load event after exit notification");
            return None;
        }
        Some(inner.session.retained.retain(name, bytes))
    }

    /// The host is exiting: stop recording. Returns `false` if this had
    /// already happened.
    pub fn notify_exit(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.state != CaptureState::Running {
            return false;
        }
        inner.state = CaptureState::ShuttingDown;
        info!(recorded = inner.session.retained.len(), "capture session shutting down");
        true
    }

    /// Write every recorded class to `store`, in recorded order.
    ///
    /// Generated classes are named (referenced generated classes first) and
    /// stored under their identifiers with all generated names rewritten;
    /// other classes are stored unchanged under their own names. A class that
    /// cannot be named or written is reported and skipped.
    pub fn dump(&self, store: &FsArtifactStore) -> Result<DumpReport, CaptureError> {
        let mut inner = self.inner.lock();
        match inner.state {
            CaptureState::Running => return Err(CaptureError::StillRunning),
            CaptureState::Dumped => return Err(CaptureError::AlreadyDumped),
            CaptureState::ShuttingDown => {}
        }
        inner.state = CaptureState::Dumped;

        let mut report = DumpReport {
            recorded: inner.session.retained.len(),
            dry_run: self.dry_run,
            ignored_after_exit: inner.ignored_after_exit,
            ..DumpReport::default()
        };

        let names: Vec<String> =
            inner.session.retained.iter().map(|c| c.logical_name.clone()).collect();
        for name in names {
            let (target, bytes) = if inner.session.namer.patterns().is_generated(&name) {
                report.generated += 1;
                match inner.session.resolve(&name) {
                    Ok(record) => (record.identifier.clone(), record.rewritten_bytes.clone()),
                    Err(err) => {
                        report_naming_failure(&name, &err);
                        report
                            .format_failures
                            .push(DumpFailure { class: name.clone(), error: err.to_string() });
                        continue;
                    }
                }
            } else {
                let bytes = inner.session.retained.bytes_of(&name).unwrap_or_default().to_vec();
                (name.clone(), bytes)
            };

            if self.dry_run {
                continue;
            }
            match store.put(&target, &bytes) {
                Ok(PutOutcome::Created) => report.created += 1,
                Ok(PutOutcome::Overwritten) => report.overwritten += 1,
                Err(err) => {
                    error!(class = %name, artifact = %target, error = %err, "failed to write class");
                    report.io_failures.push(DumpFailure { class: name, error: err.to_string() });
                }
            }
        }

        info!(
            created = report.created,
            overwritten = report.overwritten,
            failed = report.io_failures.len() + report.format_failures.len(),
            "capture dump finished"
        );
        Ok(report)
    }
}

fn report_naming_failure(name: &str, err: &NamingError) {
    match err {
        NamingError::Format(source) => {
            error!(class = name, error = ?source, "malformed class bytes; not stored")
        }
        other => warn!(class = name, error = %other, "cannot name generated class; not stored"),
    }
}

impl ClassLoadHook for CapturePipeline {
    fn on_class_load(
        &self,
        name: Option<&str>,
        bytes: &[u8],
    ) -> Result<Option<Vec<u8>>, HookError> {
        let name = event_name(name, bytes)?;
        self.record(&name, bytes);
        Ok(None)
    }
}
