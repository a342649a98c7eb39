use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, warn};

use crate::classfile::{ClassFile, FormatError};
use crate::model::GeneratedClassRecord;
use crate::normalizer::rewriter::{rewrite, MappingError, ReferenceMapping};
use crate::normalizer::{content_digest, GeneratedNamePatterns};
use crate::session::RetentionTable;

/// Token standing in for a generated class's own name while hashing.
pub const SELF_PLACEHOLDER: &str = "$$CanonicalSelf$$";

/// Separates the run-independent stem from the content hash in an identifier.
pub const HASH_SEPARATOR: &str = "$HASHED$";

#[derive(Debug, Error)]
pub enum NamingError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("class {class} references generated class {reference}, which has not been seen")]
    UnresolvedReference { class: String, reference: String },

    #[error("generated class {class} is part of a reference cycle")]
    ReferenceCycle { class: String },

    #[error("class {class} references two generated classes that share identifier {identifier}")]
    AmbiguousReference { class: String, identifier: String },

    #[error("no retained bytes for generated class {0}")]
    NotRetained(String),

    #[error("cannot canonicalize {class}: {source}")]
    Mapping {
        class: String,
        #[source]
        source: MappingError,
    },
}

/// Content-derived naming for generated classes.
///
/// Each generated class gets an identifier computed from its bytes with its own
/// name replaced by [`SELF_PLACEHOLDER`] and every referenced generated class
/// replaced by that class's identifier. Identical content therefore yields the
/// same identifier in every run, provided referenced classes are resolved
/// first. Records are created on first request and never replaced.
#[derive(Debug, Clone)]
pub struct Namer {
    patterns: GeneratedNamePatterns,
    canonicalize: bool,
    records: HashMap<String, GeneratedClassRecord>,
    by_identifier: HashMap<String, String>,
}

impl Namer {
    pub fn new(patterns: GeneratedNamePatterns) -> Self {
        Self { patterns, canonicalize: true, records: HashMap::new(), by_identifier: HashMap::new() }
    }

    /// Pass-through naming: every identifier is the logical name itself and no
    /// bytes are rewritten.
    pub fn without_canonicalization(mut self) -> Self {
        self.canonicalize = false;
        self
    }

    pub fn patterns(&self) -> &GeneratedNamePatterns {
        &self.patterns
    }

    pub fn canonicalizes(&self) -> bool {
        self.canonicalize
    }

    pub fn record(&self, logical_name: &str) -> Option<&GeneratedClassRecord> {
        self.records.get(logical_name)
    }

    pub fn identifier_of(&self, logical_name: &str) -> Option<&str> {
        self.records.get(logical_name).map(|r| r.identifier.as_str())
    }

    /// The logical name that first resolved to `identifier` in this session.
    pub fn logical_name_for(&self, identifier: &str) -> Option<&str> {
        self.by_identifier.get(identifier).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Resolve the identifier of `logical_name` from its original bytes.
    ///
    /// Referenced generated classes without an identifier are resolved first
    /// from `retained`; if they were never retained the request fails rather
    /// than hashing around the gap.
    pub fn resolve(
        &mut self,
        logical_name: &str,
        bytes: &[u8],
        retained: &RetentionTable,
    ) -> Result<&GeneratedClassRecord, NamingError> {
        let mut visiting = Vec::new();
        self.resolve_inner(logical_name, bytes, retained, &mut visiting)?;
        self.records.get(logical_name).ok_or_else(|| NamingError::NotRetained(logical_name.into()))
    }

    fn resolve_inner(
        &mut self,
        logical_name: &str,
        bytes: &[u8],
        retained: &RetentionTable,
        visiting: &mut Vec<String>,
    ) -> Result<(), NamingError> {
        let source_digest = content_digest(bytes);
        if let Some(existing) = self.records.get(logical_name) {
            if existing.source_digest != source_digest {
                warn!(
                    class = logical_name,
                    identifier = %existing.identifier,
                    "different bytes for an already named generated class; keeping the first"
                );
            }
            return Ok(());
        }
        if visiting.iter().any(|v| v == logical_name) {
            return Err(NamingError::ReferenceCycle { class: logical_name.to_string() });
        }
        visiting.push(logical_name.to_string());

        let class = ClassFile::parse(bytes)?;
        let declared = class.declared_name()?;
        let references = self.patterns.generated_references(&class)?;

        let record = if self.canonicalize {
            let mut referenced_identifiers = Vec::with_capacity(references.len());
            for reference in &references {
                if !self.records.contains_key(reference) {
                    let Some(reference_bytes) = retained.bytes_of(reference) else {
                        return Err(NamingError::UnresolvedReference {
                            class: logical_name.to_string(),
                            reference: reference.clone(),
                        });
                    };
                    debug!(class = logical_name, reference = %reference, "resolving reference first");
                    self.resolve_inner(reference, reference_bytes, retained, visiting)?;
                }
                let identifier = &self.records[reference].identifier;
                if referenced_identifiers.contains(identifier) {
                    return Err(NamingError::AmbiguousReference {
                        class: logical_name.to_string(),
                        identifier: identifier.clone(),
                    });
                }
                referenced_identifiers.push(identifier.clone());
            }

            let mapping_error =
                |source| NamingError::Mapping { class: logical_name.to_string(), source };
            let mut canonical = ReferenceMapping::new();
            canonical.insert(&declared, SELF_PLACEHOLDER).map_err(mapping_error)?;
            for (reference, identifier) in references.iter().zip(&referenced_identifiers) {
                canonical.insert(reference, identifier).map_err(mapping_error)?;
            }

            let hash = content_digest(&rewrite(bytes, &canonical)?);
            let identifier = self.identifier_for(logical_name, &hash);

            let mut persisted = ReferenceMapping::new();
            persisted.insert(&declared, &identifier).map_err(mapping_error)?;
            for (reference, id) in references.iter().zip(&referenced_identifiers) {
                persisted.insert(reference, id).map_err(mapping_error)?;
            }
            let rewritten_bytes = rewrite(bytes, &persisted)?;

            GeneratedClassRecord {
                logical_name: logical_name.to_string(),
                identifier,
                rewritten_bytes,
                referenced_names: references,
                referenced_identifiers,
                source_digest,
            }
        } else {
            GeneratedClassRecord {
                logical_name: logical_name.to_string(),
                identifier: logical_name.to_string(),
                rewritten_bytes: bytes.to_vec(),
                referenced_identifiers: references.clone(),
                referenced_names: references,
                source_digest,
            }
        };

        debug!(class = logical_name, identifier = %record.identifier, "named generated class");
        self.by_identifier
            .entry(record.identifier.clone())
            .or_insert_with(|| logical_name.to_string());
        self.records.insert(logical_name.to_string(), record);
        visiting.pop();
        Ok(())
    }

    fn identifier_for(&self, logical_name: &str, hash: &str) -> String {
        let stem = self.patterns.stem(logical_name).unwrap_or(logical_name);
        format!("{stem}{HASH_SEPARATOR}{hash}")
    }
}
