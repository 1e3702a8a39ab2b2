//! Built-in layers driven through a real manifest

use serde_json::{Map, json};
use synapse_core::{Session, SynapseEngine};
use synapse_test_utils::TestSynapse;

const MANIFEST: &str = r#"
version = "2.0"

[[layers]]
name = "constitution"
kind = "file"

[layers.settings]
path = "rules/constitution.md"

[[layers]]
name = "keywords"
kind = "keyword"

[[layers.settings.rules]]
pattern = "\\bdeploy"
text = "Deployments require a green pipeline."

[[layers]]
name = "history"

[layers.settings]
limit = 2
"#;

#[test]
fn built_in_layers_compose_a_turn() {
    let synapse = TestSynapse::new().with_root();
    synapse.write_file("rules/constitution.md", "Never skip tests.\n");
    synapse.write_manifest(MANIFEST);
    let engine = SynapseEngine::new(synapse.synapse_path());

    let first = engine.process("deploy the app", Session::default(), Map::new()).unwrap();
    assert!(first.errors.is_empty(), "{:?}", first.errors);
    assert_eq!(
        first.text,
        "Never skip tests.\n\nDeployments require a green pipeline."
    );

    let second = engine.process("now add docs", first.session, Map::new()).unwrap();
    assert_eq!(
        second.text,
        "Never skip tests.\n\nRecent prompts:\n- deploy the app"
    );
    assert_eq!(second.session.prompt_count, 2);
}

#[test]
fn missing_layer_file_degrades_only_that_layer() {
    let synapse = TestSynapse::new().with_root();
    synapse.write_manifest(MANIFEST);
    let engine = SynapseEngine::new(synapse.synapse_path());

    let outcome = engine.process("deploy", Session::default(), Map::new()).unwrap();

    assert_eq!(outcome.text, "Deployments require a green pipeline.");
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].layer, "constitution");
}

#[test]
fn corrupt_history_slot_recovers_on_the_next_turn() {
    let synapse = TestSynapse::new().with_root();
    synapse.write_manifest("[[layers]]\nname = \"history\"\n");
    let engine = SynapseEngine::new(synapse.synapse_path());
    let mut session = Session::default();
    session.state.insert("history".into(), json!("garbage"));

    let first = engine.process("one", session, Map::new()).unwrap();
    assert!(first.errors.is_empty(), "{:?}", first.errors);
    assert_eq!(first.text, "");
    assert_eq!(first.session.layer_state("history"), Some(&json!({ "recent": ["one"] })));

    let second = engine.process("two", first.session, Map::new()).unwrap();
    let third = engine.process("three", second.session, Map::new()).unwrap();
    assert!(third.errors.is_empty());
    assert_eq!(third.text, "Recent prompts:\n- one\n- two");
}
