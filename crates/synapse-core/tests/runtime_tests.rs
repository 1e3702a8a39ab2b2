//! Hook runtime: root discovery, config layering, session persistence

use pretty_assertions::assert_eq;
use serde_json::json;
use synapse_core::{HookInput, SessionLoad, resolve_from_input, resolve_hook_runtime};
use synapse_test_utils::TestSynapse;
use tempfile::TempDir;

const ECHO_MANIFEST: &str = "[[layers]]\nname = \"rules\"\nkind = \"file\"\n\n\
                             [layers.settings]\npath = \"rules.md\"\n";

#[test]
fn no_runtime_without_cwd() {
    assert!(resolve_hook_runtime(None, Some("abc")).is_none());
}

#[test]
fn no_runtime_without_synapse_dir() {
    let synapse = TestSynapse::new();
    assert!(resolve_hook_runtime(Some(synapse.cwd()), Some("abc")).is_none());
}

#[test]
fn no_runtime_for_missing_directory() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("gone");
    assert!(resolve_hook_runtime(Some(&missing), None).is_none());
}

#[test]
fn fresh_session_starts_at_zero() {
    let synapse = TestSynapse::new().with_root();
    let runtime = resolve_hook_runtime(Some(synapse.cwd()), Some("abc")).unwrap();

    assert!(matches!(runtime.session_load(), SessionLoad::Fresh(_)));
    assert_eq!(runtime.session.prompt_count, 0);
    assert_eq!(runtime.session_id(), Some("abc"));
}

#[test]
fn process_persists_incremented_session() {
    let synapse = TestSynapse::new().with_root();
    synapse.write_manifest(ECHO_MANIFEST);
    synapse.write_file("rules.md", "Be concise.");
    let mut runtime = resolve_hook_runtime(Some(synapse.cwd()), Some("abc")).unwrap();

    let turn = runtime.process("hello").unwrap();

    assert_eq!(turn.payload.additional_context(), "Be concise.");
    assert!(turn.persist_warning.is_none());
    assert_eq!(synapse.prompt_count("abc"), Some(1));

    runtime.process("again").unwrap();
    assert_eq!(synapse.prompt_count("abc"), Some(2));
}

#[test]
fn sessions_continue_across_resolutions() {
    let synapse = TestSynapse::new().with_root();
    synapse.write_session("abc", &json!({ "prompt_count": 4, "state": {}, "owner": "kept" }));

    let mut runtime = resolve_hook_runtime(Some(synapse.cwd()), Some("abc")).unwrap();
    assert!(matches!(runtime.session_load(), SessionLoad::Loaded(_)));
    assert_eq!(runtime.session.prompt_count, 4);
    runtime.process("next").unwrap();

    let stored = synapse.read_session("abc").unwrap();
    assert_eq!(stored["prompt_count"], json!(5));
    assert_eq!(stored["owner"], json!("kept"));
    assert!(stored["updated_at"].is_string());
}

#[test]
fn transient_session_is_not_written() {
    let synapse = TestSynapse::new().with_root();
    let mut runtime = resolve_hook_runtime(Some(synapse.cwd()), None).unwrap();

    let turn = runtime.process("hello").unwrap();

    assert_eq!(turn.run.session.prompt_count, 1);
    synapse.assert_file_not_exists(".synapse/sessions");
}

#[test]
fn corrupt_record_degrades_and_is_backed_up() {
    let synapse = TestSynapse::new().with_root();
    synapse.write_file("sessions/abc.json", "{ not json");
    let mut runtime = resolve_hook_runtime(Some(synapse.cwd()), Some("abc")).unwrap();

    assert!(runtime.session_load().is_degraded());
    assert_eq!(runtime.session.prompt_count, 0);

    let turn = runtime.process("hello").unwrap();

    assert!(turn.session_degraded.is_some());
    assert_eq!(synapse.prompt_count("abc"), Some(1));
    synapse.assert_file_exists(".synapse/sessions/abc.json.bak");
}

#[test]
fn config_layers_reach_the_layers() {
    let synapse = TestSynapse::new().with_root();
    synapse.write_manifest(
        "[[layers]]\nname = \"dev\"\nkind = \"file\"\n\n\
         [layers.settings]\npath = \"dev.md\"\ndevmode_only = true\n",
    );
    synapse.write_file("dev.md", "debug hints");
    synapse.write_file("config.toml", "devmode = false\n");
    synapse.write_file("config.local.toml", "devmode = true\n");
    let global = TempDir::new().unwrap();

    let mut runtime = resolve_hook_runtime(Some(synapse.cwd()), None).unwrap();
    runtime.set_global_config_dir(global.path());
    let turn = runtime.process("").unwrap();

    assert_eq!(turn.run.text, "debug hints");
}

#[test]
fn invalid_config_is_fatal() {
    let synapse = TestSynapse::new().with_root();
    synapse.write_file("config.toml", "devmode = \"yes\"\n");
    let global = TempDir::new().unwrap();

    let mut runtime = resolve_hook_runtime(Some(synapse.cwd()), None).unwrap();
    runtime.set_global_config_dir(global.path());

    assert!(runtime.process("").is_err());
}

#[test]
fn persist_failure_becomes_warning() {
    let synapse = TestSynapse::new().with_root();
    synapse.write_manifest(ECHO_MANIFEST);
    synapse.write_file("rules.md", "Be concise.");
    // a plain file where the sessions directory belongs
    synapse.write_file("sessions", "not a directory");
    let mut runtime = resolve_hook_runtime(Some(synapse.cwd()), Some("abc")).unwrap();

    let turn = runtime.process("hello").unwrap();

    assert_eq!(turn.payload.additional_context(), "Be concise.");
    assert!(turn.persist_warning.is_some());
}

#[test]
fn resolves_from_hook_input() {
    let synapse = TestSynapse::new().with_root();
    let raw = json!({
        "cwd": synapse.cwd(),
        "session_id": "abc",
        "prompt": "hi",
    })
    .to_string();
    let input = HookInput::parse(&raw).unwrap();

    let runtime = resolve_from_input(&input).unwrap();
    assert_eq!(runtime.session_id(), Some("abc"));
}
