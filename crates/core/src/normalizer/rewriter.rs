use indexmap::IndexMap;
use thiserror::Error;

use crate::classfile::{descriptor_class_tokens, mutf8, ClassFile, FormatError, SlotKind};

/// Rejected attempt to build a non-bijective mapping.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MappingError {
    #[error("'{from}' is already mapped to '{existing}'")]
    DuplicateSource { from: String, existing: String },
    #[error("'{to}' is already the target of '{existing}'")]
    DuplicateTarget { to: String, existing: String },
}

/// Ordered `from -> to` class-name mapping, built fresh for every rewrite.
///
/// Inserts are checked so the mapping stays injective; that is what makes
/// `rewrite(rewrite(b, m), m.inverse()) == b` hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceMapping {
    pairs: IndexMap<String, String>,
}

impl ReferenceMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Result<(), MappingError> {
        let (from, to) = (from.into(), to.into());
        if let Some(existing) = self.pairs.get(&from) {
            if *existing == to {
                return Ok(());
            }
            return Err(MappingError::DuplicateSource { from, existing: existing.clone() });
        }
        if let Some((existing, _)) = self.pairs.iter().find(|(_, t)| **t == to) {
            return Err(MappingError::DuplicateTarget { to, existing: existing.clone() });
        }
        self.pairs.insert(from, to);
        Ok(())
    }

    pub fn get(&self, from: &str) -> Option<&str> {
        self.pairs.get(from).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(f, t)| (f.as_str(), t.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// The mapping with every pair reversed.
    pub fn inverse(&self) -> Self {
        Self { pairs: self.pairs.iter().map(|(f, t)| (t.clone(), f.clone())).collect() }
    }
}

/// Mapping pairs as Utf8-entry bytes, so names compare exactly as stored.
struct EncodedPairs {
    pairs: Vec<(Vec<u8>, Vec<u8>)>,
}

impl EncodedPairs {
    fn new(mapping: &ReferenceMapping) -> Self {
        let pairs = mapping.iter().map(|(f, t)| (mutf8::encode(f), mutf8::encode(t))).collect();
        Self { pairs }
    }

    fn lookup(&self, name: &[u8]) -> Option<(usize, &[u8])> {
        self.pairs
            .iter()
            .enumerate()
            .find(|(_, (from, _))| from.as_slice() == name)
            .map(|(i, (_, to))| (i, to.as_slice()))
    }
}

/// Rename class references inside a class file.
///
/// Only name slots are touched: Utf8 entries that a Class entry names (exact
/// match) and `L<name>;` tokens inside descriptor-shaped Utf8 entries. String
/// constants keep their value. When a String shares its Utf8 entry with a
/// renamed Class, the Class gets a new entry appended to the pool. Every source
/// name in `mapping` must occupy at least one slot, otherwise the class is not
/// what the caller thinks it is and a `FormatError` is returned.
pub fn rewrite(bytes: &[u8], mapping: &ReferenceMapping) -> Result<Vec<u8>, FormatError> {
    let mut class = ClassFile::parse(bytes)?;
    class.declared_name_index()?;
    if mapping.is_empty() {
        return Ok(bytes.to_vec());
    }

    let pairs = EncodedPairs::new(mapping);
    let mut touched = vec![false; pairs.pairs.len()];
    let mut replacements = Vec::new();

    for (slot, content) in class.name_slots() {
        let replaced = match slot.kind {
            SlotKind::ClassName => pairs.lookup(content).map(|(i, to)| {
                touched[i] = true;
                to.to_vec()
            }),
            SlotKind::Descriptor => rewrite_descriptor(content, &pairs, &mut touched),
        };
        if let Some(new_content) = replaced {
            if new_content.len() > u16::MAX as usize {
                return Err(FormatError::Utf8TooLong { index: slot.index, len: new_content.len() });
            }
            replacements.push((slot, new_content));
        }
    }

    for ((from, _), hit) in mapping.iter().zip(&touched) {
        if !*hit {
            return Err(FormatError::MissingReference { name: from.to_string() });
        }
    }

    for (slot, new_content) in replacements {
        if slot.shared_with_string {
            let split = class.push_utf8(new_content)?;
            class.repoint_class_names(slot.index, split);
        } else {
            class.set_utf8(slot.index, new_content)?;
        }
    }

    Ok(class.to_bytes())
}

/// Replace mapped names in `L<name>;` tokens; `None` when nothing matched.
fn rewrite_descriptor(
    content: &[u8],
    pairs: &EncodedPairs,
    touched: &mut [bool],
) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(content.len());
    let mut last = 0;
    let mut changed = false;
    for (start, end) in descriptor_class_tokens(content) {
        if let Some((i, to)) = pairs.lookup(&content[start..end]) {
            touched[i] = true;
            changed = true;
            out.extend_from_slice(&content[last..start]);
            out.extend_from_slice(to);
            last = end;
        }
    }
    if !changed {
        return None;
    }
    out.extend_from_slice(&content[last..]);
    Some(out)
}
