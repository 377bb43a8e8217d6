use std::sync::Arc;

use rucksjoin::{DB, DBOptions, Iterable, Slice, WriteOptions};

fn store(entries: &[(&str, &str)]) -> Arc<DB> {
    let db = DB::open(DBOptions::default());
    for (key, value) in entries {
        db.put(&WriteOptions::default(), Slice::from(*key), Slice::from(*value))
            .unwrap();
    }
    db
}

fn letters() -> Arc<DB> {
    store(&[
        ("a", "1"),
        ("b", "2"),
        ("c", "3"),
        ("l", "12"),
        ("m", "13"),
        ("n", "14"),
        ("x", "24"),
        ("y", "25"),
        ("z", "26"),
    ])
}

fn keys(iterable: &Iterable) -> Vec<String> {
    iterable
        .iter()
        .unwrap()
        .map(|entry| String::from_utf8(entry.unwrap().0.to_vec()).unwrap())
        .collect()
}

#[test]
fn test_full_scan_and_reverse() {
    let db = letters();
    let all = keys(&db.iterable());
    assert_eq!(all, vec!["a", "b", "c", "l", "m", "n", "x", "y", "z"]);

    let mut reversed = all.clone();
    reversed.reverse();
    assert_eq!(keys(&db.iterable().reverse()), reversed);
}

#[test]
fn test_values_follow_keys() {
    let db = letters();
    let entries: Vec<(Slice, Slice)> = db
        .iterable()
        .range("l", "n")
        .unwrap()
        .iter()
        .unwrap()
        .collect::<rucksjoin::Result<_>>()
        .unwrap();
    assert_eq!(
        entries,
        vec![
            (Slice::from("l"), Slice::from("12")),
            (Slice::from("m"), Slice::from("13"))
        ]
    );
}

#[test]
fn test_range_is_half_open() {
    let db = letters();
    assert_eq!(keys(&db.iterable().range("c", "y").unwrap()), vec![
        "c", "l", "m", "n", "x"
    ]);
}

#[test]
fn test_reverse_then_range() {
    let db = letters();
    assert_eq!(
        keys(&db.iterable().reverse().range("y", "c").unwrap()),
        vec!["y", "x", "n", "m", "l"]
    );
}

#[test]
fn test_range_then_reverse_swaps_bounds() {
    let db = letters();
    let swapped = db.iterable().range("c", "y").unwrap().reverse();
    assert_eq!(keys(&swapped), vec!["y", "x", "n", "m", "l"]);
    assert_eq!(
        keys(&swapped),
        keys(&db.iterable().reverse().range("y", "c").unwrap())
    );
}

#[test]
fn test_prefix_both_directions() {
    let db = store(&[
        ("a", "1"),
        ("aa", "2"),
        ("ab", "3"),
        ("b", "4"),
        ("ba", "5"),
        ("bb", "6"),
        ("c", "7"),
    ]);
    assert_eq!(keys(&db.iterable().prefix("a").unwrap()), vec!["a", "aa", "ab"]);
    assert_eq!(
        keys(&db.iterable().prefix("a").unwrap().reverse()),
        vec!["ab", "aa", "a"]
    );
    assert_eq!(
        keys(&db.iterable().reverse().prefix("b").unwrap()),
        vec!["bb", "ba", "b"]
    );
}

#[test]
fn test_snapshot_isolation_and_refresh() {
    let db = letters();
    let iterable = db.iterable();
    iterable.snapshot();

    for key in ["b", "m", "n", "z"] {
        db.delete(&WriteOptions::default(), Slice::from(key))
            .unwrap();
    }
    assert_eq!(keys(&iterable), vec![
        "a", "b", "c", "l", "m", "n", "x", "y", "z"
    ]);

    iterable.snapshot();
    assert_eq!(keys(&iterable), vec!["a", "c", "l", "x", "y"]);
}

#[test]
fn test_snapshot_released_with_last_holder() {
    let db = letters();
    let iterable = db.iterable();
    iterable.snapshot();
    assert_eq!(db.property("rucksjoin.num-snapshots").as_deref(), Some("1"));

    let iter = iterable.get_iterator().unwrap();
    iterable.release_snapshot();
    assert_eq!(db.property("rucksjoin.num-snapshots").as_deref(), Some("1"));

    drop(iter);
    assert_eq!(db.property("rucksjoin.num-snapshots").as_deref(), Some("0"));
}

#[test]
fn test_range_errors() {
    let db = letters();
    let iterable = db.iterable();

    assert!(iterable.range("y", "c").unwrap_err().is_invalid_range());
    assert!(
        iterable
            .reverse()
            .range("c", "y")
            .unwrap_err()
            .is_invalid_range()
    );

    let narrowed = iterable.range("c", "y").unwrap();
    assert!(narrowed.range("a", "m").unwrap_err().is_out_of_range());
    assert!(narrowed.range("m", "z").unwrap_err().is_out_of_range());
    assert_eq!(keys(&narrowed.range("l", "x").unwrap()), vec!["l", "m", "n"]);

    let mut iter = narrowed.get_iterator().unwrap();
    assert!(iter.seek(&Slice::from("z")).unwrap_err().is_out_of_range());
    assert!(iter.seek(&Slice::from("m")).unwrap());
    assert_eq!(iter.key(), Slice::from("m"));
}

#[test]
fn test_disposed_iterator() {
    let db = letters();
    let mut iter = db.iterable().range("c", "y").unwrap().get_iterator().unwrap();
    assert!(iter.move_next().unwrap());
    iter.dispose();

    assert!(!iter.valid());
    assert!(iter.move_next().unwrap_err().is_disposed());
    assert!(iter.move_prev().unwrap_err().is_disposed());
    assert!(iter.seek_to_first().unwrap_err().is_disposed());
    assert_eq!(db.statistics().unwrap().num_live_cursors(), 0);
}

#[test]
fn test_cursors_released_on_every_path() {
    let db = letters();
    let iterable = db.iterable().prefix("m").unwrap();
    for _ in 0..3 {
        let mut entries = iterable.iter().unwrap();
        assert!(entries.next().is_some());
    }
    let stats = db.statistics().unwrap();
    assert_eq!(stats.num_cursors_opened(), 3);
    assert_eq!(stats.num_live_cursors(), 0);
}

#[test]
fn test_move_prev_walks_backward() {
    let db = letters();
    let mut iter = db.iterable().range("c", "y").unwrap().get_iterator().unwrap();
    let mut seen = Vec::new();
    while iter.move_prev().unwrap() {
        seen.push(iter.key());
    }
    assert_eq!(seen, vec![
        Slice::from("x"),
        Slice::from("n"),
        Slice::from("m"),
        Slice::from("l"),
        Slice::from("c")
    ]);
}

#[test]
fn test_iterables_shared_across_threads() {
    let db = letters();
    let iterable = db.iterable().range("c", "y").unwrap();
    iterable.snapshot();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let iterable = iterable.clone();
            std::thread::spawn(move || keys(&iterable))
        })
        .collect();
    db.delete(&WriteOptions::default(), Slice::from("m"))
        .unwrap();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), vec!["c", "l", "m", "n", "x"]);
    }
}

#[test]
fn test_checksums_verified_on_request() {
    let db = DB::open(DBOptions {
        paranoid_checks: true,
        ..Default::default()
    });
    db.put(&WriteOptions::default(), Slice::from("k"), Slice::from("v"))
        .unwrap();
    assert_eq!(keys(&db.iterable().verify_checksums(true)), vec!["k"]);
    assert_eq!(db.statistics().unwrap().num_checksum_failures(), 0);
}

#[test]
fn test_compaction_keeps_versions_of_open_iterator() {
    let db = DB::open(DBOptions::default());
    db.put(&WriteOptions::default(), Slice::from("a"), Slice::from("1"))
        .unwrap();
    db.put(&WriteOptions::default(), Slice::from("k"), Slice::from("v1"))
        .unwrap();

    let mut iter = db.iterable().get_iterator().unwrap();
    assert!(iter.move_next().unwrap());
    assert_eq!(iter.key(), Slice::from("a"));

    db.put(&WriteOptions::default(), Slice::from("k"), Slice::from("v2"))
        .unwrap();
    db.compact().unwrap();

    assert!(iter.move_next().unwrap());
    assert_eq!(iter.key(), Slice::from("k"));
    assert_eq!(iter.value(), Slice::from("v1"));
    assert!(!iter.move_next().unwrap());
    assert_eq!(db.property("rucksjoin.num-snapshots").as_deref(), Some("0"));

    drop(iter);
    db.compact().unwrap();
    assert_eq!(db.property("rucksjoin.num-entries").as_deref(), Some("2"));
}
