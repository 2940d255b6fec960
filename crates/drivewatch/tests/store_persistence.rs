//! Dataset load and save through the filesystem.

use std::fs;

use drivewatch::Error;
use drivewatch::api;
use drivewatch::domain::{EventKind, Severity};
use drivewatch::store::{AlertQuery, MemoryStore, SafetyStore};

const DATASET: &str = r#"{
  "drivers": [
    { "id": 1, "name": "Ada Moss", "vehicle": "TRK-9", "status": "off_duty" }
  ],
  "alerts": [
    { "id": 10, "driver_id": 1, "kind": "drowsiness", "occurred_at": "2024-02-01T03:00:00Z" },
    { "id": 11, "driver_id": 1, "kind": "phone_use", "severity": "critical",
      "occurred_at": "2024-02-01T04:00:00Z", "acknowledged": true }
  ]
}"#;

#[test]
fn load_applies_defaults_and_names_dataset_after_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("north-depot.json");
    fs::write(&path, DATASET).expect("write");

    let store = MemoryStore::load(&path).expect("load");
    assert_eq!(store.name(), "north-depot");
    let alerts = store.alerts(&AlertQuery::default());
    assert_eq!(alerts.iter().map(|a| a.id).collect::<Vec<_>>(), vec![11, 10]);
    assert_eq!(alerts[1].severity, Severity::Critical);
    assert_eq!(alerts[0].kind, EventKind::PhoneUse);
    assert!(store.notifications().is_empty());
    assert_eq!(store.open_alert_count(1), 1);
}

#[test]
fn save_then_load_keeps_mutations() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("fleet.json");
    fs::write(&path, DATASET).expect("write");

    let mut store = MemoryStore::load(&path).expect("load");
    assert!(api::acknowledge_alert(&mut store, 10).success);
    assert!(api::delete_alert(&mut store, 11).success);
    store.save(&path).expect("save");

    let reloaded = MemoryStore::load(&path).expect("reload");
    let alerts = reloaded.alerts(&AlertQuery::default());
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0].acknowledged);
    assert_eq!(reloaded.dataset(), store.dataset());
}

#[test]
fn missing_and_malformed_files_are_typed_errors() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("absent.json");
    assert!(matches!(MemoryStore::load(&missing), Err(Error::Io { .. })));

    let broken = dir.path().join("broken.json");
    fs::write(&broken, "{ \"drivers\": [").expect("write");
    let err = MemoryStore::load(&broken).unwrap_err();
    assert!(matches!(err, Error::Json { .. }));
    assert!(err.to_string().contains("broken.json"));
}
