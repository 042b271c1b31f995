//! Behavioral tests for the persisted fair value store.

use fairval_store::{
    EffectiveValue, FairValueSource, FairValueStore, PriorityOrder, StoreError, StoreOptions,
};
use rstest::rstest;
use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;
use std::thread;

fn store_in(dir: &tempfile::TempDir) -> FairValueStore {
    FairValueStore::new(StoreOptions::in_dir(dir.path()))
}

#[test]
fn test_missing_file_is_empty_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    let doc = store.load().unwrap();
    assert_eq!(doc.priority, PriorityOrder::default());
    assert!(doc.combined().is_empty());
    assert_eq!(store.resolve("X").unwrap(), None);
}

#[test]
fn test_priority_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    store.set_priority_names(&["manual", "dcf", "analyst"]).unwrap();

    let reopened = store_in(&dir);
    let names: Vec<_> = reopened
        .load()
        .unwrap()
        .priority
        .iter()
        .map(|s| s.name())
        .collect();
    assert_eq!(names, vec!["manual", "dcf", "analyst"]);

    store.set_priority_names(&["analyst", "dcf", "manual"]).unwrap();
    assert_eq!(
        reopened.priority().unwrap().sources(),
        &[
            FairValueSource::Analyst,
            FairValueSource::Dcf,
            FairValueSource::Manual
        ]
    );
}

#[test]
fn test_resolution_determinism() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    store.set(FairValueSource::Dcf, "X", 10.0).unwrap();
    store.set(FairValueSource::Manual, "X", 12.0).unwrap();

    store.set_priority_names(&["manual", "dcf", "analyst"]).unwrap();
    assert_eq!(
        store.resolve("X").unwrap(),
        Some(EffectiveValue {
            value: 12.0,
            source: FairValueSource::Manual
        })
    );

    store.set_priority_names(&["dcf", "manual", "analyst"]).unwrap();
    assert_eq!(
        store.resolve("X").unwrap(),
        Some(EffectiveValue {
            value: 10.0,
            source: FairValueSource::Dcf
        })
    );
}

#[test]
fn test_absence_falls_through() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    store.set(FairValueSource::Dcf, "X", 10.0).unwrap();
    store.set_priority_names(&["manual", "dcf", "analyst"]).unwrap();
    assert_eq!(
        store.resolve("X").unwrap().map(|e| (e.value, e.source)),
        Some((10.0, FairValueSource::Dcf))
    );
}

#[test]
fn test_invalid_value_leaves_entry_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    store.set(FairValueSource::Dcf, "Y", 4.0).unwrap();
    let before = fs::read_to_string(store.path()).unwrap();

    let err = store.set(FairValueSource::Dcf, "Y", -5.0).unwrap_err();
    assert!(matches!(err, StoreError::InvalidValue { value, .. } if value == -5.0));
    assert_eq!(store.get(FairValueSource::Dcf, "Y").unwrap(), Some(4.0));
    assert_eq!(fs::read_to_string(store.path()).unwrap(), before);
}

#[test]
fn test_invalid_priority_keeps_old_order() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    store.set_priority_names(&["analyst", "manual", "dcf"]).unwrap();

    for bad in [
        vec!["dcf", "dcf", "manual"],
        vec!["dcf", "manual"],
        vec!["dcf", "manual", "broker"],
    ] {
        assert!(matches!(
            store.set_priority_names(&bad),
            Err(StoreError::PriorityInvalid(_))
        ));
    }
    assert_eq!(
        store.priority().unwrap().to_string(),
        "[analyst, manual, dcf]"
    );
}

#[test]
fn test_set_only_touches_its_source() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    store.set(FairValueSource::Analyst, "A", 5.0).unwrap();
    let analyst_time = store.load().unwrap().source_updated[&FairValueSource::Analyst];

    store.set(FairValueSource::Manual, "B", 6.0).unwrap();
    let doc = store.load().unwrap();
    assert_eq!(doc.source_updated[&FairValueSource::Analyst], analyst_time);
    assert_eq!(doc.get(FairValueSource::Analyst, "A"), Some(5.0));
    assert_eq!(
        doc.last_updated.map(|l| l.source),
        Some(FairValueSource::Manual)
    );
}

#[rstest]
#[case::missing_priority(r#"{"sources":{"dcf":{},"manual":{},"analyst":{}},"last_updated":null}"#)]
#[case::missing_source(r#"{"sources":{"dcf":{},"manual":{}},"priority":["manual","dcf","analyst"],"last_updated":null}"#)]
#[case::missing_last_updated(r#"{"sources":{"dcf":{},"manual":{},"analyst":{}},"priority":["manual","dcf","analyst"]}"#)]
#[case::unknown_source(r#"{"sources":{"dcf":{},"manual":{},"analyst":{},"broker":{"X":1}},"priority":["manual","dcf","analyst"],"last_updated":null}"#)]
#[case::unknown_priority_name(r#"{"sources":{"dcf":{},"manual":{},"analyst":{}},"priority":["manual","dcf","broker"],"last_updated":null}"#)]
#[case::duplicate_priority(r#"{"sources":{"dcf":{},"manual":{},"analyst":{}},"priority":["manual","dcf","dcf"],"last_updated":null}"#)]
#[case::zero_value(r#"{"sources":{"dcf":{"X":0},"manual":{},"analyst":{}},"priority":["manual","dcf","analyst"],"last_updated":null}"#)]
#[case::negative_value(r#"{"sources":{"dcf":{},"manual":{"X":-3.5},"analyst":{}},"priority":["manual","dcf","analyst"],"last_updated":null}"#)]
#[case::not_json("fair values go here")]
#[case::empty("")]
fn test_corrupt_document_fails_fast(#[case] contents: &str) {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    fs::write(store.path(), contents).unwrap();

    assert!(matches!(store.load(), Err(StoreError::ConfigCorrupt { .. })));
    // Writes need the current document too, so they halt as well
    assert!(matches!(
        store.set(FairValueSource::Manual, "X", 1.0),
        Err(StoreError::ConfigCorrupt { .. })
    ));
    assert_eq!(fs::read_to_string(store.path()).unwrap(), contents);
}

#[test]
fn test_no_temp_files_left_behind() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    for i in 0..5 {
        store.set(FairValueSource::Dcf, "X", f64::from(i + 1)).unwrap();
    }
    let mut names: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec!["fair_values_config.json", "fair_values_config.json.lock"]
    );
}

#[test]
fn test_backups_are_pruned() {
    let dir = tempfile::tempdir().unwrap();
    let backups = dir.path().join("backups");
    let store = FairValueStore::new(StoreOptions::in_dir(dir.path()).with_backups(&backups, 3));

    for i in 0..6 {
        store.set(FairValueSource::Manual, "X", f64::from(i + 1)).unwrap();
    }

    // The first save has nothing to back up
    let count = fs::read_dir(&backups).unwrap().count();
    assert_eq!(count, 3);
    assert_eq!(store.get(FairValueSource::Manual, "X").unwrap(), Some(6.0));
}

#[test]
fn test_replace_source_all_or_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    store.set(FairValueSource::Analyst, "OLD", 1.0).unwrap();

    let bad = BTreeMap::from([("A".to_string(), 2.0), ("B".to_string(), f64::NAN)]);
    assert!(store.replace_source(FairValueSource::Analyst, &bad).is_err());
    assert_eq!(store.get(FairValueSource::Analyst, "OLD").unwrap(), Some(1.0));

    let good = BTreeMap::from([("A".to_string(), 2.0)]);
    store.replace_source(FairValueSource::Analyst, &good).unwrap();
    assert_eq!(store.get(FairValueSource::Analyst, "OLD").unwrap(), None);
    assert_eq!(store.get(FairValueSource::Analyst, "A").unwrap(), Some(2.0));
}

#[test]
fn test_legacy_import() {
    let dir = tempfile::tempdir().unwrap();
    let dcf_file = dir.path().join("dcf_fair_values.json");
    let analyst_file = dir.path().join("fair_values.json");
    fs::write(
        &dcf_file,
        r#"{"values": {"ASML.AS": 712.4, "BAD.AS": -1}, "last_updated": "2024-03-01"}"#,
    )
    .unwrap();
    fs::write(&analyst_file, r#"{"ASML.AS": 780.0, "INGA.AS": 17.5}"#).unwrap();

    let store = store_in(&dir);
    let dcf = store.import_legacy_dcf(&dcf_file).unwrap();
    assert_eq!(dcf.values.len(), 1);
    assert_eq!(dcf.skipped, vec!["BAD.AS".to_string()]);

    let analyst = store.import_legacy_analyst(&analyst_file).unwrap();
    assert_eq!(analyst.values.len(), 2);

    let combined = store.combined().unwrap();
    assert_eq!(combined["ASML.AS"].source, FairValueSource::Dcf);
    assert_eq!(combined["INGA.AS"].source, FairValueSource::Analyst);

    fs::write(&dcf_file, r#"{"ASML.AS": 1.0}"#).unwrap();
    assert!(matches!(
        store.import_legacy_dcf(&dcf_file),
        Err(StoreError::Serialization(_))
    ));
}

#[test]
fn test_concurrent_writers_do_not_lose_updates() {
    let dir = tempfile::tempdir().unwrap();
    let shared = Arc::new(store_in(&dir));

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let shared = Arc::clone(&shared);
            // Half the writers go through their own handle on the same file
            let own = store_in(&dir);
            thread::spawn(move || {
                for i in 0..10 {
                    let ticker = format!("T{t}-{i}");
                    let value = f64::from(t * 100 + i + 1);
                    if t % 2 == 0 {
                        shared.set(FairValueSource::Dcf, &ticker, value).unwrap();
                    } else {
                        own.set(FairValueSource::Dcf, &ticker, value).unwrap();
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let doc = shared.load().unwrap();
    assert_eq!(doc.sources.dcf.len(), 80);
    assert_eq!(doc.get(FairValueSource::Dcf, "T3-7"), Some(308.0));
}
