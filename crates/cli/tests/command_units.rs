mod common;

use class_replay::commands::{
    classify_names, init_config_command, internal_name, replay_inputs, resolve_inputs,
};
use class_replay::ClassInput;
use common::{class_bytes, write_class};
use replay_core::config::AgentConfig;
use replay_core::model::ToolingKind;
use replay_core::normalizer::HASH_SEPARATOR;
use tempfile::tempdir;

fn input(name: &str, bytes: Vec<u8>) -> ClassInput {
    ClassInput { path: format!("{name}.class").into(), bytes }
}

fn config_with_helpers() -> AgentConfig {
    AgentConfig { extra_generated_patterns: vec!["$Helper".into()], ..AgentConfig::default() }
}

#[test]
fn dotted_names_are_converted() {
    assert_eq!(internal_name("com.example.Main$Inner"), "com/example/Main$Inner");
}

#[test]
fn classify_reports_generated_stem_and_exclusions() {
    let rows = classify_names(
        &AgentConfig::default(),
        &[
            "com.sun.proxy.$Proxy12".to_string(),
            "dev/classreplay/Agent".to_string(),
            "org/objectweb/asm/ClassReader".to_string(),
            "app/Main".to_string(),
        ],
    );

    assert_eq!(rows[0].name, "com/sun/proxy/$Proxy12");
    assert!(rows[0].generated);
    assert_eq!(rows[0].stem.as_deref(), Some("com/sun/proxy/$Proxy"));
    assert_eq!(rows[1].excluded, Some(ToolingKind::Agent));
    assert_eq!(rows[2].excluded, Some(ToolingKind::BytecodeLibrary));
    assert!(!rows[3].generated);
    assert_eq!(rows[3].excluded, None);
}

#[test]
fn resolve_names_generated_classes_regardless_of_input_order() {
    let config = config_with_helpers();
    let resolved = resolve_inputs(
        &config,
        &[
            input("app/App$Proxy7", class_bytes("app/App$Proxy7", &["app/App$Helper3"])),
            input("app/Main", class_bytes("app/Main", &[])),
            input("app/App$Helper3", class_bytes("app/App$Helper3", &[])),
        ],
    )
    .expect("resolve");

    assert_eq!(resolved.len(), 3);
    let proxy = resolved[0].identifier.as_deref().expect("proxy identifier");
    assert!(proxy.starts_with(&format!("app/App$Proxy{HASH_SEPARATOR}")));
    assert!(!resolved[1].generated);
    assert_eq!(resolved[1].identifier, None);
    assert!(resolved[2].identifier.is_some());
}

#[test]
fn resolve_reports_unresolvable_classes_without_failing() {
    let resolved = resolve_inputs(
        &config_with_helpers(),
        &[input("app/App$Proxy7", class_bytes("app/App$Proxy7", &["app/App$Helper3"]))],
    )
    .expect("resolve");
    assert_eq!(resolved[0].identifier, None);
    assert!(resolved[0].error.as_deref().unwrap_or_default().contains("app/App$Helper3"));
}

#[test]
fn resolve_rejects_unreadable_class_files() {
    let err = resolve_inputs(&AgentConfig::default(), &[input("junk", b"junk".to_vec())])
        .expect_err("must fail");
    assert!(err.to_string().contains("junk.class"));
}

#[test]
fn replay_writes_loaded_bytes_and_counts_outcomes() {
    let corpus = tempdir().expect("tempdir");
    let loaded = tempdir().expect("tempdir");
    let stored_main = common::ClassSpec::new("app/Main").with_string("stored").build();
    write_class(corpus.path(), "app/Main", &stored_main);

    let config = AgentConfig {
        source_path: corpus.path().display().to_string(),
        ..config_with_helpers()
    };
    let summary = replay_inputs(
        &config,
        &[
            input("app/Main", class_bytes("app/Main", &[])),
            input("app/Other", class_bytes("app/Other", &[])),
        ],
        Some(loaded.path()),
    )
    .expect("replay");

    assert_eq!(summary.errors, 0);
    assert_eq!(summary.stats.replaced, 1);
    assert_eq!(summary.stats.not_found, 1);
    assert_eq!(summary.classes[0].outcome, "replaced");
    assert!(summary.classes[0].modified);
    assert_eq!(summary.classes[1].detail.as_deref(), Some("NotFound"));

    let main = std::fs::read(loaded.path().join("app/Main.class")).expect("loaded main");
    assert_eq!(main, stored_main);
    let other = std::fs::read(loaded.path().join("app/Other.class")).expect("loaded other");
    assert_eq!(other, class_bytes("app/Other", &[]));
}

#[test]
fn replay_counts_unreadable_inputs_as_errors() {
    let corpus = tempdir().expect("tempdir");
    let config =
        AgentConfig { source_path: corpus.path().display().to_string(), ..AgentConfig::default() };
    let summary =
        replay_inputs(&config, &[input("junk", b"junk".to_vec())], None).expect("replay");
    assert_eq!(summary.errors, 1);
    assert_eq!(summary.classes[0].outcome, "error");
}

#[test]
fn init_config_refuses_to_overwrite_without_force() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path().to_string_lossy().to_string();

    let path = init_config_command(&root, None, false).expect("first write");
    assert_eq!(AgentConfig::load(&path).expect("load"), AgentConfig::default());

    let err = init_config_command(&root, None, false).expect_err("second write");
    assert!(err.to_string().contains("already exists"));
    init_config_command(&root, None, true).expect("forced write");
}

#[test]
fn init_config_writes_yaml_by_extension() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path().to_string_lossy().to_string();
    let path = init_config_command(&root, Some("conf/agent.yaml"), false).expect("write");
    let body = std::fs::read_to_string(&path).expect("read");
    assert!(body.contains("source_path: out"));
}
