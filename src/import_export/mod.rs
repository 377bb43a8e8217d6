use std::{
    fs,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::{
    db::{DB, WriteOptions},
    observability::log_info,
    transaction::WriteBatch,
    util::{Result, Slice, Status},
};

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct ExportEntry {
    key: Vec<u8>,
    value: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ExportFile {
    version: u32,
    sequence: u64,
    entries: Vec<ExportEntry>,
}

/// Information about an export file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFileInfo {
    pub num_entries: u64,
    /// Store sequence the export was taken at.
    pub sequence: u64,
    pub smallest_key: Option<Slice>,
    pub largest_key: Option<Slice>,
}

impl ExportFileInfo {
    fn of(file: &ExportFile) -> Self {
        ExportFileInfo {
            num_entries: file.entries.len() as u64,
            sequence: file.sequence,
            smallest_key: file.entries.first().map(|e| Slice::from(e.key.as_slice())),
            largest_key: file.entries.last().map(|e| Slice::from(e.key.as_slice())),
        }
    }
}

/// Write the live entries of the latest view of `db` to `path` as JSON.
pub fn export_to<P: AsRef<Path>>(db: &DB, path: P) -> Result<ExportFileInfo> {
    let path = path.as_ref();
    let sequence = db.latest_sequence();
    let entries = db
        .live_entries()?
        .into_iter()
        .map(|(key, value)| ExportEntry {
            key: key.to_vec(),
            value: value.to_vec(),
        })
        .collect();
    let file = ExportFile {
        version: FORMAT_VERSION,
        sequence,
        entries,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(fs::File::create(path)?);
    serde_json::to_writer(&mut writer, &file)?;
    writer.flush()?;

    let info = ExportFileInfo::of(&file);
    log_info!(
        component = "db",
        event = "store_exported",
        path = %path.display(),
        entries = info.num_entries,
        sequence = sequence,
    );
    Ok(info)
}

/// Validates an export file
///
/// Checks that the file exists, parses, has a known format version and
/// lists its keys in strictly ascending order.
pub fn validate_export_file<P: AsRef<Path>>(path: P) -> Result<ExportFileInfo> {
    let file = read_export_file(path.as_ref())?;
    Ok(ExportFileInfo::of(&file))
}

/// Load an export file into `db` as one atomic batch.
///
/// Existing keys not present in the file are left untouched.
pub fn import_from<P: AsRef<Path>>(db: &DB, path: P) -> Result<ExportFileInfo> {
    let path = path.as_ref();
    let file = read_export_file(path)?;

    let mut batch = WriteBatch::new();
    for entry in &file.entries {
        batch.put(entry.key.as_slice(), entry.value.as_slice());
    }
    db.write(&WriteOptions::default(), &batch)?;

    let info = ExportFileInfo::of(&file);
    log_info!(
        component = "db",
        event = "store_imported",
        path = %path.display(),
        entries = info.num_entries,
    );
    Ok(info)
}

fn read_export_file(path: &Path) -> Result<ExportFile> {
    if !path.exists() {
        return Err(Status::not_found(format!(
            "File not found: {}",
            path.display()
        )));
    }
    let reader = BufReader::new(fs::File::open(path)?);
    let file: ExportFile = serde_json::from_reader(reader)?;

    if file.version != FORMAT_VERSION {
        return Err(Status::not_supported(format!(
            "export format version {} (expected {FORMAT_VERSION})",
            file.version
        )));
    }
    if file.entries.windows(2).any(|pair| pair[0].key >= pair[1].key) {
        return Err(Status::corruption(format!(
            "keys out of order in {}",
            path.display()
        )));
    }
    Ok(file)
}

#[cfg(test)]
mod tests {
    use tempfile::{NamedTempFile, TempDir};

    use super::*;
    use crate::db::{DBOptions, ReadOptions};

    fn store_with(n: usize) -> std::sync::Arc<DB> {
        let db = DB::open(DBOptions::default());
        for i in 0..n {
            db.put(
                &WriteOptions::default(),
                Slice::from(format!("key{i:03}")),
                Slice::from(format!("value{i}")),
            )
            .unwrap();
        }
        db
    }

    #[test]
    fn test_export_and_import() {
        let source = store_with(100);
        source
            .delete(&WriteOptions::default(), Slice::from("key050"))
            .unwrap();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("dump.json");

        let info = export_to(&source, &path).unwrap();
        assert_eq!(info.num_entries, 99);
        assert_eq!(info.sequence, 101);
        assert_eq!(info.smallest_key, Some(Slice::from("key000")));
        assert_eq!(info.largest_key, Some(Slice::from("key099")));

        let target = DB::open(DBOptions::default());
        assert_eq!(import_from(&target, &path).unwrap(), info);
        assert_eq!(target.live_entries().unwrap(), source.live_entries().unwrap());
        assert_eq!(target.latest_sequence(), 99);
        assert_eq!(
            target
                .get(&ReadOptions::default(), &Slice::from("key050"))
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_validate_nonexistent_file() {
        let err = validate_export_file("/nonexistent/dump.json").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_validate_rejects_garbage() {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), b"not json").unwrap();
        assert!(validate_export_file(file.path()).unwrap_err().is_corruption());

        fs::write(
            file.path(),
            br#"{"version":1,"sequence":2,"entries":[{"key":[98],"value":[]},{"key":[97],"value":[]}]}"#,
        )
        .unwrap();
        assert!(validate_export_file(file.path()).unwrap_err().is_corruption());

        fs::write(file.path(), br#"{"version":9,"sequence":0,"entries":[]}"#).unwrap();
        assert_eq!(
            *validate_export_file(file.path()).unwrap_err().code(),
            crate::util::Code::NotSupported
        );
    }

    #[test]
    fn test_export_empty_store() {
        let file = NamedTempFile::new().unwrap();
        let info = export_to(&DB::open(DBOptions::default()), file.path()).unwrap();
        assert_eq!(info.num_entries, 0);
        assert_eq!(info.smallest_key, None);
    }
}
