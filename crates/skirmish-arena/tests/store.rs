use std::path::Path;

use skirmish_arena::JsonModelStore;
use skirmish_core::PersistenceError;
use skirmish_learn::{DecisionPolicy, ModelMetadata, ModelStore, PolicyConfig};

#[test]
fn saved_models_load_back() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = JsonModelStore::new(dir.path()).unwrap();
    let metadata = ModelMetadata::new("linear_q").with_value("episodes", 3);

    store
        .save_model(Path::new("squad/alpha.json"), &[1, 2, 3], &metadata)
        .unwrap();
    assert!(store.exists(Path::new("squad/alpha.json")));
    assert!(dir.path().join("squad/alpha.json").is_file());
    assert!(!dir.path().join("squad/alpha.json.tmp").exists());

    let (blob, loaded) = store.load_model(Path::new("squad/alpha.json")).unwrap();
    assert_eq!(blob, vec![1, 2, 3]);
    assert_eq!(loaded, metadata);
    assert_eq!(loaded.get("episodes"), Some("3"));
}

#[test]
fn missing_and_corrupt_files_are_errors() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonModelStore::new(dir.path()).unwrap();

    let missing = store.load_model(Path::new("nope.json")).unwrap_err();
    assert!(matches!(missing, PersistenceError::Io(_)));

    std::fs::write(dir.path().join("bad.json"), b"{not json").unwrap();
    let corrupt = store.load_model(Path::new("bad.json")).unwrap_err();
    assert!(matches!(corrupt, PersistenceError::Decode(_)));
}

#[test]
fn incompatible_format_versions_are_refused() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = JsonModelStore::new(dir.path()).unwrap();
    let mut metadata = ModelMetadata::new("linear_q");
    metadata.format_version = 99;
    store
        .save_model(Path::new("old.json"), &[0], &metadata)
        .unwrap();

    let err = store.load_model(Path::new("old.json")).unwrap_err();
    assert!(matches!(
        err,
        PersistenceError::Version { found: 99, .. }
    ));
}

#[test]
fn policies_round_trip_through_json_files() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = JsonModelStore::new(dir.path()).unwrap();
    let policy = DecisionPolicy::linear(PolicyConfig::default(), 17);
    let saved = policy
        .save_model(&mut store, Path::new("skirmisher-0.json"))
        .unwrap();

    let mut fresh = DecisionPolicy::linear(PolicyConfig::default(), 17);
    let loaded = fresh
        .load_model(&store, Path::new("skirmisher-0.json"))
        .unwrap();
    assert_eq!(loaded.model_id, saved.model_id);

    let mut wrong_shape = DecisionPolicy::linear(PolicyConfig::default(), 5);
    assert!(wrong_shape
        .load_model(&store, Path::new("skirmisher-0.json"))
        .is_err());
}
