//! Modified UTF-8, the encoding of class-file Utf8 entries.
//!
//! It differs from UTF-8 in two places: NUL is written as `C0 80`, and
//! characters outside the BMP are written as a surrogate pair with three bytes
//! per surrogate. Names are compared in this encoding, so a name read from one
//! entry always matches the bytes of another entry holding the same text.

/// Decode Utf8-entry contents; `None` when they are not valid modified UTF-8.
pub fn decode(bytes: &[u8]) -> Option<String> {
    if bytes.iter().all(|b| (0x01..0x80).contains(b)) {
        return std::str::from_utf8(bytes).ok().map(str::to_owned);
    }

    let mut units = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let lead = bytes[i];
        let (unit, len) = match lead {
            0x01..=0x7F => (u16::from(lead), 1),
            0xC0..=0xDF => {
                let b1 = continuation(bytes, i + 1)?;
                ((u16::from(lead & 0x1F) << 6) | b1, 2)
            }
            0xE0..=0xEF => {
                let b1 = continuation(bytes, i + 1)?;
                let b2 = continuation(bytes, i + 2)?;
                ((u16::from(lead & 0x0F) << 12) | (b1 << 6) | b2, 3)
            }
            _ => return None,
        };
        units.push(unit);
        i += len;
    }
    String::from_utf16(&units).ok()
}

fn continuation(bytes: &[u8], index: usize) -> Option<u16> {
    match bytes.get(index) {
        Some(b) if b & 0xC0 == 0x80 => Some(u16::from(b & 0x3F)),
        _ => None,
    }
}

/// Encode text the way a Utf8 entry stores it.
pub fn encode(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for unit in text.encode_utf16() {
        match unit {
            0x0001..=0x007F => out.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                out.push(0xC0 | (unit >> 6) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                out.push(0xE0 | (unit >> 12) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    out
}
