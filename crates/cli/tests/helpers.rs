mod common;

use std::fs;

use class_replay::{canonicalize_or_current, read_class_inputs};
use common::{class_bytes, write_class};
use tempfile::tempdir;

#[test]
fn canonicalize_or_current_returns_cwd_for_dot() {
    let original = std::env::current_dir().expect("cwd");
    let tmp = tempdir().expect("tempdir");
    std::env::set_current_dir(tmp.path()).expect("chdir tmp");

    let result = canonicalize_or_current(".").expect("canonicalize").canonicalize().expect("canon");
    let expected = tmp.path().canonicalize().expect("canon tmp");
    std::env::set_current_dir(original).expect("restore cwd");
    assert_eq!(result, expected);
}

#[test]
fn canonicalize_or_current_keeps_absolute_paths() {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path().to_string_lossy().to_string();
    assert_eq!(
        canonicalize_or_current(&root).expect("canonicalize"),
        tmp.path().canonicalize().expect("canon tmp")
    );
}

#[test]
fn directory_inputs_are_walked_in_sorted_order() {
    let tmp = tempdir().expect("tempdir");
    write_class(tmp.path(), "app/Main", &class_bytes("app/Main", &[]));
    write_class(tmp.path(), "app/App$Proxy7", &class_bytes("app/App$Proxy7", &[]));
    write_class(tmp.path(), "app/App$Helper3", &class_bytes("app/App$Helper3", &[]));
    fs::write(tmp.path().join("app").join("notes.txt"), "not a class").expect("write");

    let inputs = read_class_inputs(tmp.path()).expect("read inputs");
    let files: Vec<String> = inputs
        .iter()
        .map(|i| i.path.file_name().expect("file name").to_string_lossy().into_owned())
        .collect();
    assert_eq!(files, vec!["App$Helper3.class", "App$Proxy7.class", "Main.class"]);
}

#[test]
fn manifest_inputs_keep_listed_order() {
    let tmp = tempdir().expect("tempdir");
    let main = class_bytes("app/Main", &[]);
    write_class(tmp.path(), "app/Main", &main);
    write_class(tmp.path(), "app/App$Proxy7", &class_bytes("app/App$Proxy7", &[]));
    let manifest = tmp.path().join("load-order.txt");
    fs::write(&manifest, "# load order\napp/Main.class\n\napp/App$Proxy7.class\n")
        .expect("write manifest");

    let inputs = read_class_inputs(&manifest).expect("read inputs");
    assert_eq!(inputs.len(), 2);
    assert_eq!(inputs[0].bytes, main);
    assert!(inputs[1].path.ends_with("app/App$Proxy7.class"));
}

#[test]
fn missing_input_is_an_error() {
    let tmp = tempdir().expect("tempdir");
    let err = read_class_inputs(&tmp.path().join("absent")).expect_err("must fail");
    assert!(err.to_string().contains("Input does not exist"));
}

#[test]
fn manifest_naming_a_missing_file_is_an_error() {
    let tmp = tempdir().expect("tempdir");
    let manifest = tmp.path().join("load-order.txt");
    fs::write(&manifest, "app/Gone.class\n").expect("write manifest");
    let err = read_class_inputs(&manifest).expect_err("must fail");
    assert!(format!("{err:#}").contains("Gone.class"));
}
