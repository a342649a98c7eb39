//! Session-scoped state shared by the class-load events of one pipeline.
//!
//! The retention table keeps the original bytes of classes in first-seen order
//! so that generated classes can be named after the classes they reference.
//! [`SessionState`] bundles it with the namer; pipelines keep it behind a
//! single mutex.

use indexmap::IndexMap;
use tracing::warn;

use crate::model::{BinaryClass, GeneratedClassRecord};
use crate::normalizer::{Namer, NamingError};

/// What `RetentionTable::retain` did with the offered bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetainOutcome {
    Inserted,
    /// Same name, same bytes as before.
    Unchanged,
    /// Same name, different bytes; the first value was kept.
    Diverged,
}

/// Insertion-ordered `logical name -> original bytes` table.
#[derive(Debug, Clone, Default)]
pub struct RetentionTable {
    entries: IndexMap<String, BinaryClass>,
    next_order: u64,
}

impl RetentionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `bytes` under `logical_name` unless the name is already present.
    pub fn retain(&mut self, logical_name: &str, bytes: &[u8]) -> RetainOutcome {
        if let Some(existing) = self.entries.get(logical_name) {
            if existing.bytes == bytes {
                return RetainOutcome::Unchanged;
            }
            warn!(
                class = logical_name,
                first_len = existing.bytes.len(),
                new_len = bytes.len(),
                "two different classes share this name; keeping the first"
            );
            return RetainOutcome::Diverged;
        }
        let class = BinaryClass::new(logical_name, bytes.to_vec(), self.next_order);
        self.next_order += 1;
        self.entries.insert(logical_name.to_string(), class);
        RetainOutcome::Inserted
    }

    pub fn get(&self, logical_name: &str) -> Option<&BinaryClass> {
        self.entries.get(logical_name)
    }

    pub fn bytes_of(&self, logical_name: &str) -> Option<&[u8]> {
        self.entries.get(logical_name).map(|c| c.bytes.as_slice())
    }

    /// Entries in the order they were first seen.
    pub fn iter(&self) -> impl Iterator<Item = &BinaryClass> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Retention table plus identifier cache for one pipeline instance.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub retained: RetentionTable,
    pub namer: Namer,
}

impl SessionState {
    pub fn new(namer: Namer) -> Self {
        Self { retained: RetentionTable::new(), namer }
    }

    /// Name a retained generated class from its first-seen bytes.
    pub fn resolve(&mut self, logical_name: &str) -> Result<&GeneratedClassRecord, NamingError> {
        let SessionState { retained, namer } = self;
        let bytes = retained
            .bytes_of(logical_name)
            .ok_or_else(|| NamingError::NotRetained(logical_name.to_string()))?;
        namer.resolve(logical_name, bytes, retained)
    }
}
