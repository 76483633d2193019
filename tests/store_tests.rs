//! Integration tests for the SQLite-backed store and entries sharing it.

use settings_registry::convert::Converter;
use settings_registry::entry::ConfigEntry;
use settings_registry::projection::build_nested;
use settings_registry::store::{SqliteBackend, ValueStore};
use settings_registry::types::{DataType, Variant};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::TempDir;

fn open_store(path: &Path) -> ValueStore {
    let backend = SqliteBackend::open(path).expect("Failed to open store");
    ValueStore::new(Arc::new(backend))
}

#[test]
fn records_survive_reopen() {
    let temp = TempDir::new().unwrap();
    let db = temp.path().join("registry.db");

    {
        let store = open_store(&db);
        assert!(store.set_record("app.port", &Variant::Int(8010), None, None));
        assert!(store.set_record(
            "vast.network.default_ports",
            &Variant::List(vec![Variant::Int(22), Variant::Int(8080)]),
            None,
            None,
        ));
    }

    let store = open_store(&db);
    assert_eq!(store.get_value("app.port", Variant::Int(0)), Variant::Int(8010));
    let record = store.get_record("vast.network.default_ports").unwrap();
    assert_eq!(record.data_type, DataType::List);
    assert_eq!(record.category, "vast");
    assert_eq!(store.list_categories(), vec!["app", "vast"]);
}

#[test]
fn explicit_type_and_category_are_kept() {
    let temp = TempDir::new().unwrap();
    let store = open_store(&temp.path().join("registry.db"));

    store.set_record("legacy.port", &Variant::from("8080"), Some(DataType::Int), Some("network"));
    let record = store.get_record("legacy.port").unwrap();
    assert_eq!(record.data_type, DataType::Int);
    assert_eq!(record.value, Variant::from("8080"));
    assert_eq!(store.list_category_records("network").len(), 1);
    assert!(store.list_category_records("legacy").is_empty());
}

#[test]
fn nested_listing_matches_manual_tree() {
    let temp = TempDir::new().unwrap();
    let store = open_store(&temp.path().join("registry.db"));
    store.set_record("database.type", &Variant::from("auto"), None, None);
    store.set_record("database.postgres.host", &Variant::from("db"), None, None);
    store.set_record("database.postgres.port", &Variant::Int(5432), None, None);

    let records = store.list_category_records("database");
    let nested = build_nested(&records);

    let mut postgres = BTreeMap::new();
    postgres.insert("host".to_string(), Variant::from("db"));
    postgres.insert("port".to_string(), Variant::Int(5432));
    let mut database = BTreeMap::new();
    database.insert("type".to_string(), Variant::from("auto"));
    database.insert("postgres".to_string(), Variant::Map(postgres));
    let mut expected = BTreeMap::new();
    expected.insert("database".to_string(), Variant::Map(database));

    assert_eq!(nested, expected);
    assert_eq!(store.list_category_nested("database"), expected);
}

#[test]
fn clear_category_removes_records_and_index() {
    let temp = TempDir::new().unwrap();
    let store = open_store(&temp.path().join("registry.db"));
    store.set_record("tts.provider", &Variant::from("zonos"), None, None);
    store.set_record("tts.zonos.model_device", &Variant::from("gpu"), None, None);
    store.set_record("stt.provider", &Variant::from("huggingface"), None, None);

    assert!(store.clear_category("tts"));
    assert!(!store.exists("tts.provider"));
    assert_eq!(store.list_categories(), vec!["stt"]);
    assert_eq!(store.list_all_records().len(), 1);
}

#[test]
fn entries_in_separate_handles_see_each_other_after_refresh() {
    let temp = TempDir::new().unwrap();
    let db = temp.path().join("registry.db");

    let first = ConfigEntry::new("PORT", "app.port", 8000, Some(Converter::Int), open_store(&db));
    let second = ConfigEntry::new("PORT", "app.port", 9999, Some(Converter::Int), open_store(&db));
    // the second handle found the first one's record
    assert_eq!(second.value(), Variant::Int(8000));

    first.set_value("8123").unwrap();
    assert_eq!(second.value(), Variant::Int(8000));
    assert_eq!(second.refresh().unwrap(), Variant::Int(8123));
}

#[test]
fn concurrent_first_initialization_stores_one_of_the_inputs() {
    let temp = TempDir::new().unwrap();
    let db = temp.path().join("registry.db");
    // create the schema before racing
    drop(open_store(&db));

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = [1111_i64, 2222]
        .into_iter()
        .map(|fallback| {
            let db = db.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let store = open_store(&db);
                barrier.wait();
                ConfigEntry::new("RACE", "race.value", fallback, Some(Converter::Int), store).value()
            })
        })
        .collect();

    let inputs = [Variant::Int(1111), Variant::Int(2222)];
    for handle in handles {
        let value = handle.join().unwrap();
        assert!(inputs.contains(&value), "unexpected value {value}");
    }

    let stored = open_store(&db).value("race.value").unwrap();
    assert!(inputs.contains(&stored), "unexpected stored value {stored}");
}
