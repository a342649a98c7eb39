//! Class-file model: just enough of the JVM class-file format to find and
//! rewrite class-name references.
//!
//! The constant pool is the class file's name table. Everything after it
//! (access flags, `this_class`, fields, methods, attributes) refers to the pool
//! by index, so rewriting Utf8 entries in place never shifts anything else; the
//! remainder of the file is kept verbatim.

pub mod mutf8;
mod pool;

use thiserror::Error;

pub use pool::PoolEntry;

/// Magic number at the start of every class file.
pub const CLASS_MAGIC: u32 = 0xCAFE_BABE;

/// Malformed or unexpected class-file content.
///
/// Any of these means an invariant is broken (the bytes are not what the
/// runtime or the corpus should contain), so callers escalate rather than
/// decline.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("class file truncated: needed {needed} byte(s) at offset {offset}")]
    Truncated { offset: usize, needed: usize },

    #[error("bad class-file magic 0x{0:08X}")]
    BadMagic(u32),

    #[error("unknown constant-pool tag {tag} at index {index}")]
    UnknownTag { tag: u8, index: u16 },

    #[error("constant-pool index {index} does not refer to a {expected} entry")]
    BadIndex { index: u16, expected: &'static str },

    #[error("class file has no declared name")]
    MissingDeclaredName,

    #[error("expected name reference '{name}' not found in constant pool")]
    MissingReference { name: String },

    #[error("Utf8 entry {index} would be {len} bytes, exceeding the class-file limit")]
    Utf8TooLong { index: u16, len: usize },

    #[error("Utf8 entry {index} is not valid modified UTF-8")]
    InvalidUtf8 { index: u16 },

    #[error("constant pool is full")]
    PoolOverflow,
}

/// Parsed class file: header, constant pool, and the untouched remainder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    /// Constant pool indexed like the class file: slot 0 and the slot after each
    /// Long/Double are `PoolEntry::Unusable`.
    pool: Vec<PoolEntry>,
    /// Bytes from `access_flags` to the end of the file.
    tail: Vec<u8>,
}

/// Big-endian cursor over class-file bytes.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], FormatError> {
        let end = self.pos.checked_add(n).filter(|end| *end <= self.bytes.len());
        let Some(end) = end else {
            return Err(FormatError::Truncated { offset: self.pos, needed: n });
        };
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, FormatError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, FormatError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, FormatError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn rest(&mut self) -> &'a [u8] {
        let slice = &self.bytes[self.pos..];
        self.pos = self.bytes.len();
        slice
    }
}

impl ClassFile {
    /// Parse a class file, validating the header and every constant-pool entry.
    pub fn parse(bytes: &[u8]) -> Result<Self, FormatError> {
        let mut reader = Reader::new(bytes);
        let magic = reader.u32()?;
        if magic != CLASS_MAGIC {
            return Err(FormatError::BadMagic(magic));
        }
        let minor_version = reader.u16()?;
        let major_version = reader.u16()?;
        let pool_count = reader.u16()?;

        let mut pool = Vec::with_capacity(pool_count as usize);
        pool.push(PoolEntry::Unusable);
        let mut index: u16 = 1;
        while index < pool_count {
            let tag = reader.u8()?;
            let entry = PoolEntry::read(tag, index, &mut reader)?;
            let wide = entry.is_wide();
            pool.push(entry);
            index += 1;
            if wide {
                if index >= pool_count {
                    return Err(FormatError::BadIndex { index, expected: "second slot of wide" });
                }
                pool.push(PoolEntry::Unusable);
                index += 1;
            }
        }

        // access_flags, this_class and super_class must at least be present.
        let tail = reader.rest().to_vec();
        if tail.len() < 6 {
            return Err(FormatError::Truncated { offset: bytes.len(), needed: 6 - tail.len() });
        }

        Ok(Self { minor_version, major_version, pool, tail })
    }

    /// Serialize back to class-file bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.tail.len() + self.pool.len() * 8 + 10);
        out.extend_from_slice(&CLASS_MAGIC.to_be_bytes());
        out.extend_from_slice(&self.minor_version.to_be_bytes());
        out.extend_from_slice(&self.major_version.to_be_bytes());
        out.extend_from_slice(&(self.pool.len() as u16).to_be_bytes());
        for entry in &self.pool {
            entry.write(&mut out);
        }
        out.extend_from_slice(&self.tail);
        out
    }

    /// Number of constant-pool slots, including slot 0.
    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }

    pub fn entry(&self, index: u16) -> Option<&PoolEntry> {
        self.pool.get(index as usize)
    }

    /// Replace the contents of an existing Utf8 entry.
    pub(crate) fn set_utf8(&mut self, index: u16, content: Vec<u8>) -> Result<(), FormatError> {
        match self.pool.get_mut(index as usize) {
            Some(PoolEntry::Utf8(existing)) => {
                *existing = content;
                Ok(())
            }
            _ => Err(FormatError::BadIndex { index, expected: "Utf8" }),
        }
    }

    /// Append a Utf8 entry and return its index.
    pub(crate) fn push_utf8(&mut self, content: Vec<u8>) -> Result<u16, FormatError> {
        let index = u16::try_from(self.pool.len())
            .ok()
            .filter(|index| *index < u16::MAX)
            .ok_or(FormatError::PoolOverflow)?;
        self.pool.push(PoolEntry::Utf8(content));
        Ok(index)
    }

    /// Point every Class entry naming `from` at `to` instead.
    pub(crate) fn repoint_class_names(&mut self, from: u16, to: u16) {
        for entry in &mut self.pool {
            if let PoolEntry::Class { name_index } = entry {
                if *name_index == from {
                    *name_index = to;
                }
            }
        }
    }

    /// Contents of the Utf8 entry at `index`.
    pub fn utf8(&self, index: u16) -> Result<&[u8], FormatError> {
        match self.entry(index) {
            Some(PoolEntry::Utf8(bytes)) => Ok(bytes),
            _ => Err(FormatError::BadIndex { index, expected: "Utf8" }),
        }
    }

    /// Index of the Utf8 entry holding the class's own name.
    pub fn declared_name_index(&self) -> Result<u16, FormatError> {
        let this_class = u16::from_be_bytes([self.tail[2], self.tail[3]]);
        match self.entry(this_class) {
            Some(PoolEntry::Class { name_index }) => {
                self.utf8(*name_index).map_err(|_| FormatError::MissingDeclaredName)?;
                Ok(*name_index)
            }
            _ => Err(FormatError::MissingDeclaredName),
        }
    }

    /// The class's own (internal, slash-separated) name.
    pub fn declared_name(&self) -> Result<String, FormatError> {
        let index = self.declared_name_index()?;
        mutf8::decode(self.utf8(index)?).ok_or(FormatError::InvalidUtf8 { index })
    }

    /// Indices of Utf8 entries referenced as the name of a Class entry.
    pub fn class_name_indices(&self) -> Vec<u16> {
        let mut indices: Vec<u16> = self
            .pool
            .iter()
            .filter_map(|entry| match entry {
                PoolEntry::Class { name_index } => Some(*name_index),
                _ => None,
            })
            .collect();
        indices.sort_unstable();
        indices.dedup();
        indices
    }

    /// Indices of Utf8 entries holding the value of a String constant.
    ///
    /// javac lets a String and a Class share one Utf8 entry when their text is
    /// equal, so an index can appear here and in [`Self::class_name_indices`].
    pub fn string_value_indices(&self) -> Vec<u16> {
        let mut indices: Vec<u16> = self.pool.iter().filter_map(PoolEntry::string_index).collect();
        indices.sort_unstable();
        indices.dedup();
        indices
    }

    /// Every class name the pool mentions, unique, in order of first
    /// appearance by pool index.
    ///
    /// Names come from Class entries (array classes unwrapped to their element
    /// type) and from `L<name>;` tokens in descriptor-shaped Utf8 entries. The
    /// value of a String constant is never a name, whatever it looks like.
    /// Names that are not valid modified UTF-8 are skipped.
    pub fn referenced_class_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let mut push = |name: &[u8]| {
            let Some(name) = mutf8::decode(name) else { return };
            if !name.is_empty() && !names.contains(&name) {
                names.push(name);
            }
        };

        for (slot, content) in self.name_slots() {
            match slot.kind {
                SlotKind::ClassName => push(content),
                SlotKind::Descriptor => {
                    for (start, end) in descriptor_class_tokens(content) {
                        push(&content[start..end]);
                    }
                }
            }
        }
        names
    }

    /// Utf8 entries that can carry class names, in pool order.
    pub(crate) fn name_slots(&self) -> Vec<(NameSlot, &[u8])> {
        let class_slots = self.class_name_indices();
        let string_values = self.string_value_indices();
        let mut slots = Vec::new();
        for (index, entry) in self.pool.iter().enumerate() {
            let PoolEntry::Utf8(content) = entry else { continue };
            let index = index as u16;
            let is_class_slot = class_slots.binary_search(&index).is_ok();
            let is_string_value = string_values.binary_search(&index).is_ok();
            let kind = if is_class_slot && content.first() != Some(&b'[') {
                SlotKind::ClassName
            } else if is_class_slot || (!is_string_value && is_descriptor_like(content)) {
                SlotKind::Descriptor
            } else {
                continue;
            };
            let slot = NameSlot { index, kind, shared_with_string: is_string_value };
            slots.push((slot, content.as_slice()));
        }
        slots
    }
}

/// How a Utf8 entry carries class names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SlotKind {
    /// The whole entry is the name of a Class entry.
    ClassName,
    /// Names appear as `L<name>;` tokens.
    Descriptor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NameSlot {
    pub index: u16,
    pub kind: SlotKind,
    /// A String constant reads the same entry, so it must not change in place.
    pub shared_with_string: bool,
}

/// Name of the class encoded in `bytes`, for load events that arrive without one.
pub fn extract_declared_name(bytes: &[u8]) -> Result<String, FormatError> {
    ClassFile::parse(bytes)?.declared_name()
}

/// Heuristic for Utf8 entries that hold field/method descriptors or generic
/// signatures rather than arbitrary string constants.
pub(crate) fn is_descriptor_like(content: &[u8]) -> bool {
    matches!(content.first(), Some(b'(' | b'L' | b'[' | b'<')) && content.contains(&b';')
}

/// Byte ranges of the class names inside `L<name>;` / `L<name><` tokens.
pub(crate) fn descriptor_class_tokens(content: &[u8]) -> Vec<(usize, usize)> {
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < content.len() {
        if content[i] != b'L' || !starts_type(content, i) {
            i += 1;
            continue;
        }
        let start = i + 1;
        let end = content[start..].iter().position(|b| matches!(b, b';' | b'<')).map(|p| start + p);
        match end {
            Some(end) if end > start => {
                tokens.push((start, end));
                i = end + 1;
            }
            _ => i += 1,
        }
    }
    tokens
}

/// Whether an `L` at `pos` can begin a reference type in a descriptor or
/// signature: at the start, or after a delimiter, array marker, primitive
/// type, or another completed type.
fn starts_type(content: &[u8], pos: usize) -> bool {
    if pos == 0 {
        return true;
    }
    matches!(
        content[pos - 1],
        b'(' | b')' | b';' | b'[' | b'<' | b'>' | b':' | b'^' | b'+' | b'-' | b'*'
            | b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b'V'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_tokens_cover_method_and_generic_signatures() {
        let desc = b"(ILcom/a/B;[Lcom/c/D;)Ljava/util/List<Lcom/e/F;>;";
        let names: Vec<&[u8]> =
            descriptor_class_tokens(desc).into_iter().map(|(s, e)| &desc[s..e]).collect();
        assert_eq!(
            names,
            vec![
                b"com/a/B".as_slice(),
                b"com/c/D".as_slice(),
                b"java/util/List".as_slice(),
                b"com/e/F".as_slice()
            ]
        );
    }

    #[test]
    fn descriptor_heuristic_ignores_plain_strings() {
        assert!(is_descriptor_like(b"(Lcom/a/B;)V"));
        assert!(is_descriptor_like(b"Lcom/a/B;"));
        assert!(!is_descriptor_like(b"Hello, World;"));
        assert!(!is_descriptor_like(b"com/a/B"));
    }

    #[test]
    fn parse_rejects_bad_magic_and_truncation() {
        assert_eq!(
            ClassFile::parse(&[0xCA, 0xFE, 0xBA, 0xBE, 0, 0]),
            Err(FormatError::Truncated { offset: 6, needed: 2 })
        );
        assert_eq!(
            ClassFile::parse(&[0xDE, 0xAD, 0xBE, 0xEF, 0, 0, 0, 0]),
            Err(FormatError::BadMagic(0xDEAD_BEEF))
        );
    }
}
