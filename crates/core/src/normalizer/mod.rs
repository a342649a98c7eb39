//! Naming and renaming of generated classes.
//!
//! - `classifier`: which names belong to runtime-generated classes.
//! - `namer`: content-derived, run-independent identifiers for them.
//! - `rewriter`: renaming class references inside class-file bytes.

pub mod classifier;
pub mod namer;
pub mod rewriter;

use sha2::{Digest, Sha256};

pub use classifier::{GeneratedNamePatterns, DEFAULT_GENERATED_PATTERNS};
pub use namer::{Namer, NamingError, HASH_SEPARATOR, SELF_PLACEHOLDER};
pub use rewriter::{rewrite, MappingError, ReferenceMapping};

/// SHA-256 of `bytes` as a lowercase hex string.
pub fn content_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
