use std::{cmp::Ordering, sync::Arc};

use crate::{
    db::{Cursor, ReadOptions, Store},
    iterator::{Iterator, RangeIterator, ReverseIterator},
    observability::log_debug,
    util::{Result, Slice, Status},
};

/// Base iterator over a store in ascending byte order.
///
/// Read options are captured at creation. The cursor is opened on the first
/// positioning call, so building a decorator chain to validate its bounds
/// never touches the store.
pub struct DBIterator {
    store: Arc<dyn Store>,
    options: ReadOptions,
    cursor: Option<Box<dyn Cursor>>,
    started: bool,
    disposed: bool,
}

impl DBIterator {
    pub fn new(store: Arc<dyn Store>, options: ReadOptions) -> Self {
        DBIterator {
            store,
            options,
            cursor: None,
            started: false,
            disposed: false,
        }
    }

    pub fn options(&self) -> &ReadOptions {
        &self.options
    }

    fn cursor(&mut self) -> Result<&mut Box<dyn Cursor>> {
        if self.disposed {
            return Err(Status::disposed());
        }
        if self.cursor.is_none() {
            self.cursor = Some(self.store.open_cursor(&self.options)?);
        }
        self.cursor.as_mut().ok_or_else(Status::disposed)
    }
}

impl Iterator for DBIterator {
    fn valid(&self) -> bool {
        self.cursor.as_ref().is_some_and(|c| c.valid())
    }

    fn key(&self) -> Slice {
        self.cursor
            .as_ref()
            .filter(|c| c.valid())
            .map_or_else(Slice::empty, |c| c.key())
    }

    fn value(&self) -> Slice {
        self.cursor
            .as_ref()
            .filter(|c| c.valid())
            .map_or_else(Slice::empty, |c| c.value())
    }

    fn seek_to_first(&mut self) -> Result<bool> {
        let cursor = self.cursor()?;
        let found = cursor.seek_to_first()?;
        self.started = true;
        Ok(found)
    }

    fn seek_to_last(&mut self) -> Result<bool> {
        let cursor = self.cursor()?;
        let found = cursor.seek_to_last()?;
        self.started = true;
        Ok(found)
    }

    fn seek(&mut self, target: &Slice) -> Result<bool> {
        let cursor = self.cursor()?;
        let found = cursor.seek(target)?;
        self.started = true;
        Ok(found)
    }

    fn seek_for_prev(&mut self, target: &Slice) -> Result<bool> {
        let cursor = self.cursor()?;
        let found = cursor.seek_for_prev(target)?;
        self.started = true;
        Ok(found)
    }

    fn next(&mut self) -> Result<bool> {
        self.cursor()?.next()
    }

    fn prev(&mut self) -> Result<bool> {
        self.cursor()?.prev()
    }

    fn compare_keys(&self, a: &[u8], b: &[u8]) -> Ordering {
        a.cmp(b)
    }

    fn move_next(&mut self) -> Result<bool> {
        if self.started {
            self.next()
        } else {
            self.seek_to_first()
        }
    }

    fn move_prev(&mut self) -> Result<bool> {
        if self.started {
            self.prev()
        } else {
            self.seek_to_last()
        }
    }

    fn reset(&mut self) {
        self.started = false;
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        if self.cursor.take().is_some() {
            log_debug!(
                component = "cursor",
                event = "cursor_disposed",
                db_id = self.store.id(),
            );
        }
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn reverse(self: Box<Self>) -> Box<dyn Iterator> {
        Box::new(ReverseIterator::new(self))
    }

    fn range(
        self: Box<Self>,
        from: Option<Slice>,
        to: Option<Slice>,
    ) -> Result<Box<dyn Iterator>> {
        Ok(Box::new(RangeIterator::new(self, from, to)?))
    }

    fn prefix(self: Box<Self>, prefix: Slice) -> Result<Box<dyn Iterator>> {
        Ok(Box::new(RangeIterator::prefix(self, prefix)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::WriteOptions, iterator::testutil::*};

    #[test]
    fn test_full_scan_both_ways() {
        let db = db_with(&["b", "c", "a"]);
        assert_eq!(forward(base(&db).as_mut()), vec!["a", "b", "c"]);
        assert_eq!(backward(base(&db).as_mut()), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_cursor_opened_lazily() {
        let db = db_with(&["a"]);
        let iter = base(&db);
        let stats = db.statistics().unwrap();
        assert_eq!(stats.num_cursors_opened(), 0);

        let mut iter = iter;
        assert!(iter.move_next().unwrap());
        assert_eq!(stats.num_cursors_opened(), 1);
        assert_eq!(iter.value(), Slice::from("A"));
        drop(iter);
        assert_eq!(stats.num_live_cursors(), 0);
    }

    #[test]
    fn test_read_options_captured_at_creation() {
        let db = db_with(&["a"]);
        let snapshot = db.create_snapshot();
        let mut iter = DBIterator::new(db.clone(), ReadOptions::default().with_snapshot(snapshot));
        db.put(&WriteOptions::default(), Slice::from("b"), Slice::from("B"))
            .unwrap();
        assert_eq!(forward(&mut iter), vec!["a"]);
    }

    #[test]
    fn test_seek_variants() {
        let db = db_with(&["a", "c", "e"]);
        let mut iter = base(&db);
        assert!(iter.seek(&Slice::from("b")).unwrap());
        assert_eq!(iter.key(), Slice::from("c"));
        assert!(iter.seek_for_prev(&Slice::from("d")).unwrap());
        assert_eq!(iter.key(), Slice::from("c"));
        assert!(!iter.seek(&Slice::from("f")).unwrap());
        assert!(!iter.valid());
        assert!(iter.key().is_empty());
    }

    #[test]
    fn test_reset_restarts_traversal() {
        let db = db_with(&["a", "b"]);
        let mut iter = base(&db);
        assert!(iter.move_next().unwrap());
        assert!(iter.move_next().unwrap());
        iter.reset();
        assert!(iter.move_prev().unwrap());
        assert_eq!(iter.key(), Slice::from("b"));
    }

    #[test]
    fn test_dispose() {
        let db = db_with(&["a"]);
        let mut iter = base(&db);
        assert!(iter.move_next().unwrap());
        iter.dispose();
        iter.dispose();
        assert!(!iter.valid());
        assert!(iter.is_disposed());
        assert!(iter.next().unwrap_err().is_disposed());
        assert!(iter.seek_to_first().unwrap_err().is_disposed());
        assert_eq!(db.statistics().unwrap().num_live_cursors(), 0);
    }
}
