mod cursor;
#[allow(clippy::module_inception)]
mod db;
mod options;
mod store;
mod typed_db;

pub use cursor::Cursor;
pub use db::DB;
pub use options::{DBOptions, ReadOptions, WriteOptions};
pub use store::Store;
pub use typed_db::TypedDB;
