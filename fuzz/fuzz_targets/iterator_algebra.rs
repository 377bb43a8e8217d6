#![no_main]

use std::collections::BTreeSet;

use libfuzzer_sys::fuzz_target;
use rucksjoin::{DB, DBOptions, Iterable, Slice, WriteOptions};

// Fuzz target for range/prefix/reverse chains.
// The first half of the input seeds keys, the second half drives the chain.
// Every traversal that builds must visit keys in strictly monotonic order
// and only keys present in the store.
fuzz_target!(|data: &[u8]| {
    let (seed, ops) = data.split_at(data.len() / 2);

    let db = DB::open(DBOptions::default());
    let mut keys = BTreeSet::new();
    for chunk in seed.chunks(3) {
        db.put(&WriteOptions::default(), Slice::from(chunk), Slice::from("v"))
            .unwrap();
        keys.insert(chunk.to_vec());
    }

    let mut iterable: Iterable = db.iterable();
    let mut descending = false;
    let mut i = 0;
    while i < ops.len() {
        let op = ops[i] % 3;
        i += 1;
        let next = match op {
            0 => {
                descending = !descending;
                Ok(iterable.reverse())
            }
            1 => {
                let from = ops.get(i..(i + 2).min(ops.len())).unwrap_or_default().to_vec();
                i += 2;
                let to = ops.get(i..(i + 2).min(ops.len())).unwrap_or_default().to_vec();
                i += 2;
                iterable.range(from, to)
            }
            _ => {
                let prefix = ops.get(i..(i + 1).min(ops.len())).unwrap_or_default().to_vec();
                i += 1;
                iterable.prefix(prefix)
            }
        };
        match next {
            Ok(shaped) => iterable = shaped,
            Err(status) => assert!(status.is_invalid_range() || status.is_out_of_range()),
        }
    }

    let mut previous: Option<Vec<u8>> = None;
    for entry in iterable.iter().unwrap() {
        let key = entry.unwrap().0.to_vec();
        assert!(keys.contains(&key));
        if let Some(prev) = &previous {
            assert!(if descending { prev > &key } else { prev < &key });
        }
        previous = Some(key);
    }
});
