use parking_lot::Mutex;
use tracing::{debug, error, warn};

use crate::classfile::{ClassFile, FormatError};
use crate::config::{AgentConfig, ConfigError};
use crate::diagnostics::{
    DiagnosticsSink, JsonLinesSink, LoadEvent, NullSink, SubstitutionStats, SubstitutionSummary,
};
use crate::model::{DeclineReason, LoadOutcome};
use crate::normalizer::{rewrite, GeneratedNamePatterns, Namer, NamingError, ReferenceMapping};
use crate::pipeline::{event_name, ClassLoadHook, ExclusionRules, HookError};
use crate::session::SessionState;
use crate::store::ArtifactSource;

/// Play-in side: substitutes stored class bytes on each load event.
///
/// Generated classes are looked up by the identifier their current-run bytes
/// resolve to, and the stored artifact is renamed back to the names this run
/// uses before it is handed to the runtime.
pub struct SubstitutionPipeline {
    exclusions: ExclusionRules,
    patterns: GeneratedNamePatterns,
    session: Mutex<SessionState>,
    source: Box<dyn ArtifactSource>,
    sink: Box<dyn DiagnosticsSink>,
    stats: SubstitutionStats,
}

impl SubstitutionPipeline {
    pub fn new(
        namer: Namer,
        exclusions: ExclusionRules,
        source: impl ArtifactSource + 'static,
    ) -> Self {
        Self {
            exclusions,
            patterns: namer.patterns().clone(),
            session: Mutex::new(SessionState::new(namer)),
            source: Box::new(source),
            sink: Box::new(NullSink),
            stats: SubstitutionStats::new(),
        }
    }

    /// Build from startup configuration. Fails when no corpus root exists.
    pub fn from_config(config: &AgentConfig) -> Result<Self, ConfigError> {
        let lookup = config.replay_lookup()?;
        let mut namer = Namer::new(config.generated_patterns());
        if config.disable_canonicalization {
            namer = namer.without_canonicalization();
        }
        let pipeline = Self::new(namer, config.exclusion_rules(), lookup);
        Ok(match &config.diagnostics_log {
            Some(path) => pipeline.with_sink(JsonLinesSink::new(path)),
            None => pipeline,
        })
    }

    pub fn with_sink(mut self, sink: impl DiagnosticsSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn stats(&self) -> SubstitutionSummary {
        self.stats.summary()
    }

    /// Identifier resolved for a generated class in this session, if any.
    pub fn identifier_of(&self, logical_name: &str) -> Option<String> {
        self.session.lock().namer.identifier_of(logical_name).map(str::to_string)
    }

    /// Handle one load event.
    ///
    /// Expected gaps come back as `LoadOutcome::Declined`; only malformed input
    /// or a corpus that contradicts the current run is an error.
    pub fn handle(&self, name: &str, bytes: &[u8]) -> Result<LoadOutcome, HookError> {
        self.stats.invoked(name);
        match self.substitute(name, bytes) {
            Ok(LoadOutcome::Replaced(replacement)) => {
                let modified = replacement != bytes;
                self.stats.replaced();
                self.sink.record(&LoadEvent::replaced(name, modified));
                debug!(class = name, modified, "replaced class bytes");
                Ok(LoadOutcome::Replaced(replacement))
            }
            Ok(LoadOutcome::Declined(reason)) => {
                self.stats.declined(&reason);
                self.sink.record(&LoadEvent::declined(name, &reason));
                debug!(class = name, %reason, "keeping runtime bytes");
                Ok(LoadOutcome::Declined(reason))
            }
            Err(err) => {
                error!(class = name, error = ?err, "class substitution failed");
                Err(err)
            }
        }
    }

    fn substitute(&self, name: &str, bytes: &[u8]) -> Result<LoadOutcome, HookError> {
        let generated = self.patterns.is_generated(name);
        if let Some(kind) = self.exclusions.classify(name) {
            return Ok(LoadOutcome::Declined(DeclineReason::ForeignTooling(kind)));
        }
        if !generated {
            return Ok(match self.fetch(name) {
                Ok(Some(stored)) => LoadOutcome::Replaced(stored),
                Ok(None) => LoadOutcome::Declined(DeclineReason::NotFound),
                Err(reason) => LoadOutcome::Declined(reason),
            });
        }

        let mut session = self.session.lock();
        session.retained.retain(name, bytes);
        let (identifier, referenced_names) = match session.resolve(name) {
            Ok(record) => (record.identifier.clone(), record.referenced_names.clone()),
            Err(NamingError::Format(source)) => return Err(HookError::format(name, source)),
            Err(
                err @ (NamingError::UnresolvedReference { .. }
                | NamingError::ReferenceCycle { .. }
                | NamingError::AmbiguousReference { .. }),
            ) => {
                warn!(class = name, error = %err, "cannot name generated class");
                return Ok(LoadOutcome::Declined(DeclineReason::UnresolvedReference));
            }
            Err(source) => return Err(HookError::Naming { class: name.to_string(), source }),
        };
        drop(session);

        let stored = match self.fetch(&identifier) {
            Ok(Some(stored)) => stored,
            Ok(None) => return Ok(LoadOutcome::Declined(DeclineReason::NotFound)),
            Err(reason) => return Ok(LoadOutcome::Declined(reason)),
        };

        let Some(mapping) = self.reverse_mapping(name, &identifier, &referenced_names, &stored)?
        else {
            return Ok(LoadOutcome::Declined(DeclineReason::UnresolvedReference));
        };
        let restored = rewrite(&stored, &mapping).map_err(|e| HookError::format(name, e))?;
        Ok(LoadOutcome::Replaced(restored))
    }

    /// `stored identifier -> name`, plus each generated class the stored
    /// artifact references mapped to the name this run gave the class at the
    /// same position in the original bytes. `None` when the pairs cannot be
    /// told apart, so the names could not be restored unambiguously.
    fn reverse_mapping(
        &self,
        name: &str,
        identifier: &str,
        referenced_names: &[String],
        stored: &[u8],
    ) -> Result<Option<ReferenceMapping>, HookError> {
        let format = |e| HookError::format(name, e);
        let stored_class = ClassFile::parse(stored).map_err(format)?;
        if stored_class.declared_name().map_err(format)? != identifier {
            return Err(format(FormatError::MissingReference {
                name: identifier.to_string(),
            }));
        }
        let stored_references = self.patterns.generated_references(&stored_class).map_err(format)?;
        if stored_references.len() != referenced_names.len() {
            let missing = referenced_names
                .get(stored_references.len())
                .or_else(|| stored_references.get(referenced_names.len()))
                .cloned()
                .unwrap_or_default();
            return Err(format(FormatError::MissingReference { name: missing }));
        }

        let mut mapping = ReferenceMapping::new();
        let references = stored_references.iter().zip(referenced_names);
        let pairs = std::iter::once((identifier, name))
            .chain(references.map(|(from, to)| (from.as_str(), to.as_str())));
        for (from, to) in pairs {
            if let Err(err) = mapping.insert(from, to) {
                warn!(class = name, error = %err, "stored artifact cannot be mapped back");
                return Ok(None);
            }
        }
        Ok(Some(mapping))
    }

    fn fetch(&self, artifact: &str) -> Result<Option<Vec<u8>>, DeclineReason> {
        self.source.fetch(artifact).map_err(|err| {
            warn!(artifact, error = %err, "failed to read stored artifact");
            DeclineReason::Io
        })
    }
}

impl ClassLoadHook for SubstitutionPipeline {
    fn on_class_load(
        &self,
        name: Option<&str>,
        bytes: &[u8],
    ) -> Result<Option<Vec<u8>>, HookError> {
        let name = event_name(name, bytes)?;
        self.handle(&name, bytes).map(LoadOutcome::into_replacement)
    }
}
