use pretty_assertions::assert_eq;
use rstest::rstest;
use serde::{Deserialize, Serialize};
use synapse_fs::{ConfigStore, Error, NormalizedPath};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Record {
    name: String,
    count: u64,
}

#[rstest]
#[case("record.json")]
#[case("record.toml")]
fn save_then_load_preserves_record(#[case] file_name: &str) {
    let temp = assert_fs::TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join(file_name));
    let store = ConfigStore::new();
    let record = Record {
        name: "global".into(),
        count: 3,
    };

    store.save(&path, &record).unwrap();
    let loaded: Record = store.load(&path).unwrap();

    assert_eq!(loaded, record);
}

#[test]
fn load_reports_parse_errors_with_format() {
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.path().join("broken.json");
    std::fs::write(&file, "{ not json").unwrap();

    let result: Result<Record, _> = ConfigStore::new().load(&NormalizedPath::new(&file));
    match result {
        Err(Error::ConfigParse { format, .. }) => assert_eq!(format, "JSON"),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn load_if_exists_returns_none_for_missing_file() {
    let temp = assert_fs::TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("absent.toml"));
    let loaded: Option<Record> = ConfigStore::new().load_if_exists(&path).unwrap();
    assert!(loaded.is_none());
}

#[test]
fn unsupported_extension_is_rejected() {
    let path = NormalizedPath::new("/tmp/record.yaml");
    let result = ConfigStore::new().save(&path, &Record { name: "x".into(), count: 0 });
    assert!(matches!(result, Err(Error::UnsupportedFormat { .. })));
}

#[test]
fn save_writes_pretty_json_with_trailing_newline() {
    use assert_fs::prelude::*;
    use predicates::prelude::*;

    let temp = assert_fs::TempDir::new().unwrap();
    let child = temp.child("nested/record.json");
    let record = Record {
        name: "local".into(),
        count: 1,
    };

    ConfigStore::new()
        .save(&NormalizedPath::new(child.path()), &record)
        .unwrap();

    child.assert(predicate::path::is_file());
    child.assert(
        predicate::str::contains("  \"name\": \"local\"").and(predicate::str::ends_with("}\n")),
    );
}
