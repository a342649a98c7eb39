use super::{FormatError, Reader};

const TAG_UTF8: u8 = 1;
const TAG_INTEGER: u8 = 3;
const TAG_FLOAT: u8 = 4;
const TAG_LONG: u8 = 5;
const TAG_DOUBLE: u8 = 6;
const TAG_CLASS: u8 = 7;
const TAG_STRING: u8 = 8;
const TAG_FIELDREF: u8 = 9;
const TAG_METHODREF: u8 = 10;
const TAG_INTERFACE_METHODREF: u8 = 11;
const TAG_NAME_AND_TYPE: u8 = 12;
const TAG_METHOD_HANDLE: u8 = 15;
const TAG_METHOD_TYPE: u8 = 16;
const TAG_DYNAMIC: u8 = 17;
const TAG_INVOKE_DYNAMIC: u8 = 18;
const TAG_MODULE: u8 = 19;
const TAG_PACKAGE: u8 = 20;

/// A single constant-pool slot.
///
/// Only the entries that carry names are modelled structurally; everything else
/// is kept as its tag plus raw payload so it round-trips byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolEntry {
    /// Slot 0, and the second slot of a Long/Double.
    Unusable,
    /// Modified UTF-8 contents, without the length prefix.
    Utf8(Vec<u8>),
    Class { name_index: u16 },
    /// Any other entry: tag plus fixed-size payload.
    Raw { tag: u8, payload: Vec<u8> },
}

impl PoolEntry {
    pub(super) fn read(tag: u8, index: u16, reader: &mut Reader<'_>) -> Result<Self, FormatError> {
        let payload_len = match tag {
            TAG_UTF8 => {
                let len = reader.u16()? as usize;
                return Ok(PoolEntry::Utf8(reader.take(len)?.to_vec()));
            }
            TAG_CLASS => {
                return Ok(PoolEntry::Class { name_index: reader.u16()? });
            }
            TAG_METHOD_HANDLE => 3,
            TAG_STRING | TAG_METHOD_TYPE | TAG_MODULE | TAG_PACKAGE => 2,
            TAG_INTEGER
            | TAG_FLOAT
            | TAG_FIELDREF
            | TAG_METHODREF
            | TAG_INTERFACE_METHODREF
            | TAG_NAME_AND_TYPE
            | TAG_DYNAMIC
            | TAG_INVOKE_DYNAMIC => 4,
            TAG_LONG | TAG_DOUBLE => 8,
            other => return Err(FormatError::UnknownTag { tag: other, index }),
        };
        Ok(PoolEntry::Raw { tag, payload: reader.take(payload_len)?.to_vec() })
    }

    pub(super) fn write(&self, out: &mut Vec<u8>) {
        match self {
            PoolEntry::Unusable => {}
            PoolEntry::Utf8(bytes) => {
                out.push(TAG_UTF8);
                out.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
                out.extend_from_slice(bytes);
            }
            PoolEntry::Class { name_index } => {
                out.push(TAG_CLASS);
                out.extend_from_slice(&name_index.to_be_bytes());
            }
            PoolEntry::Raw { tag, payload } => {
                out.push(*tag);
                out.extend_from_slice(payload);
            }
        }
    }

    /// Long and Double take up two pool slots.
    pub fn is_wide(&self) -> bool {
        matches!(self, PoolEntry::Raw { tag: TAG_LONG | TAG_DOUBLE, .. })
    }

    /// Utf8 index holding the value of a String constant.
    pub fn string_index(&self) -> Option<u16> {
        match self {
            PoolEntry::Raw { tag: TAG_STRING, payload } if payload.len() == 2 => {
                Some(u16::from_be_bytes([payload[0], payload[1]]))
            }
            _ => None,
        }
    }
}
