//! The shared mapping store: a classification table as JSONL, one record per
//! line.
//!
//! Rows are written in key order, so regenerating a table from unchanged
//! input rewrites the file byte for byte. A file that repeats a
//! `(sourceSchema, definitionId)` key is rejected on load rather than
//! silently collapsed.

use crate::table::{ClassificationKey, ClassificationRecord, ClassificationTable};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Errors from classification table persistence.
#[derive(Debug, thiserror::Error)]
pub enum TableStoreError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("line {line}: read failed: {source}")]
    Read {
        line: usize,
        #[source]
        source: io::Error,
    },

    #[error("line {line}: {source}")]
    Row {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("line {line}: `{source_schema}/{definition_id}` already stored at line {first}")]
    DuplicateRow {
        line: usize,
        first: usize,
        source_schema: String,
        definition_id: String,
    },

    #[error("{}: not a UTF-8 text store", path.display())]
    Encoding { path: PathBuf },
}

impl TableStoreError {
    fn io(path: &Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Records of a JSONL stream, in file order.
///
/// Blank lines and `#` comment lines are skipped. Line numbers in errors are
/// 1-based.
pub fn read_records(reader: impl BufRead) -> Result<Vec<ClassificationRecord>, TableStoreError> {
    let mut first_seen: BTreeMap<ClassificationKey, usize> = BTreeMap::new();
    let mut records = Vec::new();
    for (offset, line) in reader.lines().enumerate() {
        let line_no = offset + 1;
        let text = line.map_err(|source| TableStoreError::Read { line: line_no, source })?;
        let row = text.trim();
        if row.is_empty() || row.starts_with('#') {
            continue;
        }
        let record: ClassificationRecord = serde_json::from_str(row)
            .map_err(|source| TableStoreError::Row { line: line_no, source })?;
        if let Some(&first) = first_seen.get(&record.key()) {
            return Err(TableStoreError::DuplicateRow {
                line: line_no,
                first,
                source_schema: record.source_schema,
                definition_id: record.definition_id,
            });
        }
        first_seen.insert(record.key(), line_no);
        records.push(record);
    }
    Ok(records)
}

/// Serialize `table` to `writer`, one record per line, in key order.
pub fn write_table(writer: &mut impl Write, table: &ClassificationTable) -> io::Result<()> {
    for record in table.records() {
        serde_json::to_writer(&mut *writer, record)?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}

/// Load the table stored at `path`.
pub fn read_table_from_path(path: impl AsRef<Path>) -> Result<ClassificationTable, TableStoreError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(TableStoreError::io(path))?;
    // NUL bytes are valid UTF-8 but never appear in a JSONL store.
    if bytes.contains(&0) || std::str::from_utf8(&bytes).is_err() {
        return Err(TableStoreError::Encoding {
            path: path.to_path_buf(),
        });
    }
    let records = read_records(bytes.as_slice())?;
    tracing::debug!(path = %path.display(), rows = records.len(), "classification table loaded");
    Ok(ClassificationTable::from_records(records))
}

/// Replace the file at `path` with `table`.
///
/// The rows go to a sibling scratch file which is synced and renamed over the
/// target; the containing directory is synced afterwards so the rename itself
/// is durable. Readers see either the old table or the new one.
pub fn write_table_to_path(
    path: impl AsRef<Path>,
    table: &ClassificationTable,
) -> Result<(), TableStoreError> {
    let path = path.as_ref();
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    fs::create_dir_all(dir).map_err(TableStoreError::io(dir))?;

    let scratch = Scratch::create(path)?;
    let mut writer = BufWriter::new(&scratch.file);
    write_table(&mut writer, table).map_err(TableStoreError::io(&scratch.path))?;
    writer.flush().map_err(TableStoreError::io(&scratch.path))?;
    drop(writer);
    scratch.commit(path)?;

    File::open(dir)
        .and_then(|handle| handle.sync_all())
        .map_err(TableStoreError::io(dir))?;

    tracing::debug!(path = %path.display(), rows = table.len(), "classification table written");
    Ok(())
}

/// Scratch file next to the target. Removed on drop unless committed.
struct Scratch {
    path: PathBuf,
    file: File,
    committed: bool,
}

impl Scratch {
    fn create(target: &Path) -> Result<Self, TableStoreError> {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let mut name = target.as_os_str().to_os_string();
        name.push(format!(".tmp.{}.{nanos}", std::process::id()));
        let path = PathBuf::from(name);
        let file = File::create(&path).map_err(TableStoreError::io(&path))?;
        Ok(Self {
            path,
            file,
            committed: false,
        })
    }

    fn commit(mut self, target: &Path) -> Result<(), TableStoreError> {
        self.file.sync_all().map_err(TableStoreError::io(&self.path))?;
        fs::rename(&self.path, target).map_err(TableStoreError::io(target))?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ConfidenceSource;
    use dpp_model::PartCategory;

    struct TempDirGuard {
        path: PathBuf,
    }

    impl TempDirGuard {
        fn new(prefix: &str) -> Self {
            let unique = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("clock should be after unix epoch")
                .as_nanos();
            let path = std::env::temp_dir().join(format!(
                "dpp-table-{prefix}-{}-{unique}",
                std::process::id()
            ));
            fs::create_dir_all(&path).expect("temp dir should be created");
            Self { path }
        }
    }

    impl Drop for TempDirGuard {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.path);
        }
    }

    fn row(id: &str, category: PartCategory) -> ClassificationRecord {
        ClassificationRecord {
            source_schema: "ECLASS".to_string(),
            definition_id: id.to_string(),
            category,
            confidence_source: ConfidenceSource::Heuristic,
            evidence: ["keyword".to_string()].into(),
            case_of: Vec::new(),
        }
    }

    #[test]
    fn nul_bytes_are_an_encoding_error() {
        let tmp = TempDirGuard::new("nul");
        let path = tmp.path.join("table.jsonl");
        fs::write(&path, b"{\"sourceSchema\":\"ECLASS\"}\n\0garbage").expect("fixture should write");

        match read_table_from_path(&path) {
            Err(TableStoreError::Encoding { path: reported }) => assert_eq!(reported, path),
            other => panic!("expected encoding error, got {other:?}"),
        }
    }

    #[test]
    fn row_errors_carry_the_line_number() {
        let input = "# classification table\n\n{\"not\": \"a record\"}\n";
        match read_records(input.as_bytes()) {
            Err(TableStoreError::Row { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected row error, got {other:?}"),
        }
    }

    #[test]
    fn repeated_keys_are_rejected() {
        let mut text = Vec::new();
        for category in [PartCategory::Sensor, PartCategory::Thermal] {
            serde_json::to_writer(&mut text, &row("X1", category)).expect("serialize");
            text.push(b'\n');
        }
        match read_records(text.as_slice()) {
            Err(TableStoreError::DuplicateRow { line, first, definition_id, .. }) => {
                assert_eq!((line, first), (2, 1));
                assert_eq!(definition_id, "X1");
            }
            other => panic!("expected duplicate row error, got {other:?}"),
        }
    }

    #[test]
    fn write_replaces_the_store_and_leaves_no_scratch_files() {
        let tmp = TempDirGuard::new("replace");
        let path = tmp.path.join("nested").join("table.jsonl");
        let first = ClassificationTable::from_records([row("stale", PartCategory::Fastener)]);
        write_table_to_path(&path, &first).expect("first write should succeed");

        let second = ClassificationTable::from_records([
            row("b", PartCategory::Sensor),
            row("a", PartCategory::Thermal),
        ]);
        write_table_to_path(&path, &second).expect("second write should succeed");

        let text = fs::read_to_string(&path).expect("jsonl should exist");
        assert!(!text.contains("stale"));
        let ids: Vec<String> = text
            .lines()
            .map(|line| {
                let value: serde_json::Value = serde_json::from_str(line).expect("row is json");
                value["definitionId"].as_str().unwrap_or_default().to_string()
            })
            .collect();
        assert_eq!(ids, vec!["a", "b"], "rows are written in key order");
        assert_eq!(read_table_from_path(&path).expect("table should load"), second);

        let entries: Vec<_> = fs::read_dir(tmp.path.join("nested"))
            .expect("dir listing")
            .filter_map(Result::ok)
            .map(|entry| entry.file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("table.jsonl")]);
    }

    #[test]
    fn parent_that_is_a_file_is_reported_by_path() {
        let tmp = TempDirGuard::new("blocked");
        let blocker = tmp.path.join("blocker");
        fs::write(&blocker, "not a directory").expect("fixture should write");
        let err = write_table_to_path(blocker.join("table.jsonl"), &ClassificationTable::new())
            .expect_err("parent is a file");
        assert!(matches!(err, TableStoreError::Io { ref path, .. } if path == &blocker));
    }
}
