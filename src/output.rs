//!
//! Raw JSON snapshot and CSV table files.
//!
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::flatten::{columns, FlatRow};
use crate::{FatalError, RecoverableError, Result};

const STEM: &str = "elevated_apps";
const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Where a run writes its files
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputFiles {
    /// Raw JSON response
    pub snapshot: PathBuf,
    /// Flattened CSV
    pub table: PathBuf,
}

impl OutputFiles {
    /// `elevated_apps.json` and `elevated_apps.csv` in `dir`, overwritten by
    /// every run
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self::with_stem(dir.as_ref(), STEM)
    }

    /// Same as [`OutputFiles::new`] with a `_YYYYmmddHHMMSS` suffix, so runs
    /// do not overwrite each other
    pub fn timestamped(dir: impl AsRef<Path>, at: chrono::NaiveDateTime) -> Self {
        let stem = format!("{STEM}_{}", at.format(TIMESTAMP_FORMAT));
        Self::with_stem(dir.as_ref(), &stem)
    }

    fn with_stem(dir: &Path, stem: &str) -> Self {
        Self {
            snapshot: dir.join(format!("{stem}.json")),
            table: dir.join(format!("{stem}.csv")),
        }
    }
}

/// Serialize `document` with four space indentation and unescaped unicode
pub fn snapshot_bytes(document: &Value) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    document.serialize(&mut ser)?;
    Ok(buf)
}

/// Write the raw document to `path`
pub fn write_snapshot(path: &Path, document: &Value) -> Result<()> {
    let bytes = snapshot_bytes(document)?;
    std::fs::write(path, bytes).map_err(|source| FatalError::Snapshot {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!("Wrote {}", path.display());
    Ok(())
}

/// Write `rows` as CSV with CRLF line endings.
///
/// The header is [`columns`] of `rows`, with no rows the output is a single
/// empty line.
pub fn write_rows<W: Write>(mut writer: W, rows: &[FlatRow]) -> csv::Result<()> {
    let header = columns(rows);
    if header.is_empty() {
        writer.write_all(b"\r\n")?;
        writer.flush()?;
        return Ok(());
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::CRLF)
        .from_writer(writer);

    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row.values().map(cell))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write `rows` to the CSV file at `path`
pub fn write_table(path: &Path, rows: &[FlatRow]) -> std::result::Result<(), RecoverableError> {
    let file = std::fs::File::create(path).map_err(|e| RecoverableError::io(path, e))?;
    write_rows(file, rows).map_err(|e| RecoverableError::csv(path, e))?;
    tracing::debug!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

/// Text of a cell, absent and `null` are empty
fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
