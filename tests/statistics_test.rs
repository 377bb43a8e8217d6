use rucksjoin::{DB, DBOptions, ReadOptions, Slice, Statistics, WriteOptions};
use tempfile::TempDir;

#[test]
fn test_statistics_track_traversals() {
    let db = DB::open(DBOptions::default());
    for key in ["a", "b", "c"] {
        db.put(&WriteOptions::default(), Slice::from(key), Slice::from("v"))
            .unwrap();
    }
    db.get(&ReadOptions::default(), &Slice::from("a"))
        .unwrap();

    let iterable = db.iterable();
    iterable.snapshot();
    assert_eq!(iterable.iter().unwrap().count(), 3);
    assert_eq!(iterable.reverse().fill_cache(false).iter().unwrap().count(), 3);
    iterable.release_snapshot();

    let stats = db.statistics().unwrap();
    assert_eq!(stats.num_keys_written(), 3);
    assert_eq!(stats.num_keys_read(), 1);
    assert_eq!(stats.num_cursors_opened(), 2);
    assert_eq!(stats.num_live_cursors(), 0);
    assert_eq!(stats.num_entries_scanned(), 6);
    assert_eq!(stats.num_fill_cache_bypass(), 1);
    assert_eq!(stats.num_snapshots_created(), 1);
    assert_eq!(stats.num_snapshots_released(), 1);

    let report = db.property("rucksjoin.stats").unwrap();
    assert!(report.contains("Store Statistics"));
    assert!(report.contains("Keys written:  3"));
    assert!(report.contains("Opened:        2"));
}

#[test]
fn test_statistics_report_format() {
    let stats = Statistics::new();
    stats.record_write(1024);
    stats.record_write(2048);
    stats.record_read(512);
    stats.record_delete();
    stats.record_compaction(4);

    let report = stats.report();
    assert!(report.contains("Keys written:  2"));
    assert!(report.contains("Keys read:     1"));
    assert!(report.contains("Keys deleted:  1"));
    assert!(report.contains("Bytes written: 3072"));
    assert!(report.contains("Bytes read:    512"));
    assert!(report.contains("Dropped:       4"));
}

#[test]
fn test_statistics_disabled() {
    let db = DB::open(DBOptions::from_json(r#"{"statistics": false}"#).unwrap());
    assert!(db.statistics().is_none());
    assert_eq!(db.property("rucksjoin.stats"), None);
    assert_eq!(db.property("rucksjoin.sequence").as_deref(), Some("0"));
}

#[test]
fn test_export_import_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fixture.json");

    let source = DB::open(DBOptions::default());
    for (key, value) in [("p1", "aaa"), ("p2", "bbb"), ("p3", "ccc")] {
        source
            .put(&WriteOptions::default(), Slice::from(key), Slice::from(value))
            .unwrap();
    }
    source
        .delete(&WriteOptions::default(), Slice::from("p2"))
        .unwrap();
    let exported = source.export_to(&path).unwrap();
    assert_eq!(exported.num_entries, 2);

    let target = DB::open(DBOptions::default());
    target.import_from(&path).unwrap();
    let keys: Vec<Slice> = target
        .iterable()
        .iter()
        .unwrap()
        .map(|entry| entry.unwrap().0)
        .collect();
    assert_eq!(keys, vec![Slice::from("p1"), Slice::from("p3")]);
}
