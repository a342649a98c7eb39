mod common;

use common::{class_bytes, ClassSpec};
use replay_core::classfile::{extract_declared_name, ClassFile, FormatError, PoolEntry};

#[test]
fn parse_then_serialize_is_byte_identical() {
    let bytes = ClassSpec::new("app/Main")
        .referencing("app/Helper")
        .with_string("hello")
        .with_opaque(b"\x00\x01opaque")
        .build();

    let class = ClassFile::parse(&bytes).expect("parse");
    assert_eq!(class.major_version, 52);
    assert_eq!(class.to_bytes(), bytes);
}

#[test]
fn long_constants_take_two_slots() {
    let bytes = class_bytes("app/Main", &[]);
    let class = ClassFile::parse(&bytes).expect("parse");

    // The builder appends the Long constant right after the two class entries.
    let long_index = (1..class.pool_len() as u16)
        .find(|i| class.entry(*i).map(PoolEntry::is_wide).unwrap_or(false))
        .expect("long entry");
    assert_eq!(class.entry(long_index + 1), Some(&PoolEntry::Unusable));
}

#[test]
fn declared_and_referenced_names() {
    let bytes = class_bytes("app/Main$Proxy3", &["app/Main$Helper1"]);
    let class = ClassFile::parse(&bytes).expect("parse");

    assert_eq!(class.declared_name().expect("declared"), "app/Main$Proxy3");
    assert_eq!(
        class.referenced_class_names(),
        vec![
            "app/Main$Proxy3".to_string(),
            "java/lang/Object".to_string(),
            "app/Main$Helper1".to_string(),
        ]
    );
    assert_eq!(extract_declared_name(&bytes).expect("extract"), "app/Main$Proxy3");
}

#[test]
fn string_constants_are_not_class_references() {
    let bytes = ClassSpec::new("app/Main").with_string("app/NotAClass").build();
    let class = ClassFile::parse(&bytes).expect("parse");
    assert!(!class.referenced_class_names().contains(&"app/NotAClass".to_string()));
}

#[test]
fn descriptor_shaped_string_constants_are_not_class_references() {
    let bytes = ClassSpec::new("app/Main").with_string("(Lapp/NotAClass;)V").build();
    let class = ClassFile::parse(&bytes).expect("parse");
    assert!(!class.referenced_class_names().contains(&"app/NotAClass".to_string()));
    assert_eq!(class.string_value_indices().len(), 1);
}

#[test]
fn name_entry_can_double_as_a_string_value() {
    let bytes = ClassSpec::new("app/Main").with_name_as_string().build();
    let class = ClassFile::parse(&bytes).expect("parse");
    let name_index = class.declared_name_index().expect("declared");
    assert_eq!(class.string_value_indices(), vec![name_index]);
    assert_eq!(class.referenced_class_names()[0], "app/Main");
}

#[test]
fn declared_name_must_be_modified_utf8() {
    let mut bytes = ClassSpec::new("app/Ma\u{0}in").build();
    let nul = bytes.windows(2).position(|w| w == [0xC0, 0x80]).expect("encoded NUL");
    assert_eq!(extract_declared_name(&bytes).expect("extract"), "app/Ma\u{0}in");

    bytes[nul + 1] = 0xC0;
    let class = ClassFile::parse(&bytes).expect("still parses");
    assert_eq!(class.declared_name(), Err(FormatError::InvalidUtf8 { index: 1 }));
}

#[test]
fn truncated_pool_is_rejected() {
    let bytes = class_bytes("app/Main", &[]);
    let err = ClassFile::parse(&bytes[..20]).expect_err("truncated input must fail");
    assert!(matches!(err, FormatError::Truncated { .. }), "unexpected error: {err}");
}

#[test]
fn unknown_tag_is_rejected() {
    let mut bytes = class_bytes("app/Main", &[]);
    // First pool entry tag sits right after the 10-byte header.
    bytes[10] = 2;
    assert_eq!(ClassFile::parse(&bytes), Err(FormatError::UnknownTag { tag: 2, index: 1 }));
}

/// Length of the builder's tail: flags, this, super, interface count, field
/// count, one field, method count, attribute count.
const TAIL_LEN: usize = 2 + 2 + 2 + 2 + 2 + 8 + 2 + 2;

#[test]
fn this_class_pointing_elsewhere_has_no_declared_name() {
    let mut bytes = class_bytes("app/Main", &[]);
    // Point this_class at the Utf8 entry (index 1) instead of the Class entry.
    let tail_start = bytes.len() - TAIL_LEN;
    bytes[tail_start + 2..tail_start + 4].copy_from_slice(&1u16.to_be_bytes());

    let class = ClassFile::parse(&bytes).expect("still parses");
    assert_eq!(class.declared_name(), Err(FormatError::MissingDeclaredName));
}
