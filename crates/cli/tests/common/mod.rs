// Shared helpers for CLI tests: a tiny class-file assembler.
#![allow(dead_code)]

use std::path::Path;

/// Constant-pool under construction; `count` is the next free index.
struct Pool {
    bytes: Vec<u8>,
    count: u16,
}

impl Pool {
    fn new() -> Self {
        Self { bytes: Vec::new(), count: 1 }
    }

    fn utf8(&mut self, s: &str) -> u16 {
        let index = self.count;
        self.bytes.push(1);
        self.bytes.extend_from_slice(&(s.len() as u16).to_be_bytes());
        self.bytes.extend_from_slice(s.as_bytes());
        self.count += 1;
        index
    }

    fn tagged(&mut self, tag: u8, a: u16, b: Option<u16>) -> u16 {
        let index = self.count;
        self.bytes.push(tag);
        self.bytes.extend_from_slice(&a.to_be_bytes());
        if let Some(b) = b {
            self.bytes.extend_from_slice(&b.to_be_bytes());
        }
        self.count += 1;
        index
    }

    fn class(&mut self, name: &str) -> u16 {
        let name_index = self.utf8(name);
        self.tagged(7, name_index, None)
    }

    fn string(&mut self, s: &str) -> u16 {
        let utf8 = self.utf8(s);
        self.tagged(8, utf8, None)
    }

    fn long(&mut self, value: i64) -> u16 {
        let index = self.count;
        self.bytes.push(5);
        self.bytes.extend_from_slice(&value.to_be_bytes());
        self.count += 2;
        index
    }
}

/// Description of a synthetic class file.
#[derive(Debug, Clone, Default)]
pub struct ClassSpec<'a> {
    pub name: &'a str,
    pub references: Vec<&'a str>,
    pub strings: Vec<&'a str>,
    /// Raw bytes of a custom class attribute, never interpreted.
    pub opaque: Option<Vec<u8>>,
}

impl<'a> ClassSpec<'a> {
    pub fn new(name: &'a str) -> Self {
        Self { name, ..Self::default() }
    }

    pub fn referencing(mut self, reference: &'a str) -> Self {
        self.references.push(reference);
        self
    }

    pub fn with_string(mut self, s: &'a str) -> Self {
        self.strings.push(s);
        self
    }

    pub fn with_opaque(mut self, bytes: &[u8]) -> Self {
        self.opaque = Some(bytes.to_vec());
        self
    }

    /// Assemble the class file.
    ///
    /// Each reference becomes a Class entry, a field ref typed with it, and a
    /// method descriptor taking it, so names appear both as class slots and
    /// inside descriptors.
    pub fn build(&self) -> Vec<u8> {
        let mut pool = Pool::new();
        let this_class = pool.class(self.name);
        let super_class = pool.class("java/lang/Object");
        for (i, reference) in self.references.iter().enumerate() {
            pool.class(reference);
            let field_name = pool.utf8(&format!("ref{i}"));
            let descriptor = pool.utf8(&format!("L{reference};"));
            let nat = pool.tagged(12, field_name, Some(descriptor));
            pool.tagged(9, this_class, Some(nat));
            pool.utf8(&format!("(IL{reference};)V"));
        }
        for s in &self.strings {
            pool.string(s);
        }
        pool.long(42);
        let field_name = pool.utf8("payload");
        let field_descriptor = pool.utf8("I");
        let attribute_name = self.opaque.as_ref().map(|_| pool.utf8("Opaque"));

        let mut out = Vec::new();
        out.extend_from_slice(&0xCAFE_BABEu32.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&52u16.to_be_bytes());
        out.extend_from_slice(&pool.count.to_be_bytes());
        out.extend_from_slice(&pool.bytes);
        out.extend_from_slice(&0x0021u16.to_be_bytes());
        out.extend_from_slice(&this_class.to_be_bytes());
        out.extend_from_slice(&super_class.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes()); // interfaces
        out.extend_from_slice(&1u16.to_be_bytes()); // fields
        out.extend_from_slice(&0x0002u16.to_be_bytes());
        out.extend_from_slice(&field_name.to_be_bytes());
        out.extend_from_slice(&field_descriptor.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes()); // methods
        match (&self.opaque, attribute_name) {
            (Some(bytes), Some(name_index)) => {
                out.extend_from_slice(&1u16.to_be_bytes());
                out.extend_from_slice(&name_index.to_be_bytes());
                out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
                out.extend_from_slice(bytes);
            }
            _ => out.extend_from_slice(&0u16.to_be_bytes()),
        }
        out
    }
}

/// Shorthand for `ClassSpec::new(name).build()` with optional references.
pub fn class_bytes(name: &str, references: &[&str]) -> Vec<u8> {
    let mut spec = ClassSpec::new(name);
    spec.references = references.to_vec();
    spec.build()
}

/// Write a synthetic class file under `root` following the package layout.
pub fn write_class(root: &Path, name: &str, bytes: &[u8]) -> std::path::PathBuf {
    let path = root.join(format!("{name}.class"));
    std::fs::create_dir_all(path.parent().expect("parent")).expect("create package dir");
    std::fs::write(&path, bytes).expect("write class");
    path
}
