#![no_main]

use libfuzzer_sys::fuzz_target;
use rucksjoin::{DB, DBOptions, ReadOptions, Slice, WriteBatch, WriteOptions};

// Fuzz target for WriteBatch operations.
// A snapshot taken before the batch must see none of it; the latest view
// must see all of it.
fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }

    let db = DB::open(DBOptions::default());
    db.put(&WriteOptions::default(), Slice::from("base"), Slice::from("0"))
        .unwrap();
    let before = db.create_snapshot();
    let before_entries = db.live_entries().unwrap();

    let mut batch = WriteBatch::new();
    let mut i = 0;
    while i + 2 < data.len() {
        let op_type = data[i] % 2;
        i += 1;
        let key_len = (data[i] as usize % 8).min(data.len() - i - 1);
        i += 1;
        let key = &data[i..i + key_len];
        i += key_len;
        match op_type {
            0 => batch.put(key, Slice::from(vec![op_type; key_len])),
            _ => batch.delete(key),
        };
    }
    db.write(&WriteOptions::default(), &batch).unwrap();

    let pinned = db
        .iterable_with(ReadOptions::default().with_snapshot(before))
        .iter()
        .unwrap()
        .collect::<rucksjoin::Result<Vec<_>>>()
        .unwrap();
    assert_eq!(pinned, before_entries);

    let latest = db.iterable().iter().unwrap().count();
    assert_eq!(latest, db.live_entries().unwrap().len());
});
