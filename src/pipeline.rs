//!
//! A complete export: fetch, snapshot, flatten, write.
//!
use std::path::PathBuf;

use crate::flatten::flatten;
use crate::output::{write_snapshot, write_table, OutputFiles};
use crate::{AuditLog, Client, RecoverableError, Result};

/// Outcome of an export that got past the fetch
#[derive(Debug)]
pub struct Report {
    /// Records in the response
    pub records: usize,
    /// Rows in the table
    pub rows: usize,
    /// Raw JSON file
    pub snapshot: PathBuf,
    /// CSV file, or why it could not be written
    pub table: std::result::Result<PathBuf, RecoverableError>,
}

impl Report {
    /// Treat a failed CSV write as an error
    pub fn strict(self) -> std::result::Result<Self, RecoverableError> {
        match self.table {
            Ok(_) => Ok(self),
            Err(e) => Err(e),
        }
    }
}

/// Fetch the audit log and export it to `output`.
///
/// Returns `None` when there are no audit logs, in which case no files are
/// written.
pub async fn run(client: &Client, output: &OutputFiles) -> Result<Option<Report>> {
    let Some(log) = client.fetch_audit_log().await? else {
        tracing::info!("No audit logs found.");
        return Ok(None);
    };
    export(&log, output).map(Some)
}

/// Write the snapshot and the flattened table of `log`.
///
/// Only a snapshot failure is returned as an error, table failures are
/// logged and reported in [`Report::table`].
pub fn export(log: &AuditLog, output: &OutputFiles) -> Result<Report> {
    write_snapshot(&output.snapshot, log.raw())?;
    tracing::info!("Audit logs saved to {}.", output.snapshot.display());

    let rows = flatten(log.records());
    tracing::debug!(
        "Flattened {} records into {} rows",
        log.records().len(),
        rows.len()
    );

    let table = match write_table(&output.table, &rows) {
        Ok(()) => {
            tracing::info!("Elevated applications saved to {}.", output.table.display());
            Ok(output.table.clone())
        }
        Err(e) => {
            tracing::error!("{}", e);
            Err(e)
        }
    };

    Ok(Report {
        records: log.records().len(),
        rows: rows.len(),
        snapshot: output.snapshot.clone(),
        table,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::{json, Value};

    fn log(doc: Value) -> AuditLog {
        AuditLog::from_value(doc).unwrap().unwrap()
    }

    #[test]
    fn export_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let output = OutputFiles::new(dir.path());
        let doc = json!([
            {"id": 1, "user": {"account": "joe"}, "elevatedApplications": [{"name": "a"}, {"name": "b"}]},
            {"id": 2, "elevatedApplications": []}
        ]);

        let report = export(&log(doc.clone()), &output).unwrap().strict().unwrap();
        assert_eq!(report.records, 2);
        assert_eq!(report.rows, 2);
        assert_eq!(report.table.as_ref().unwrap(), &output.table);

        let snapshot: Value =
            serde_json::from_str(&std::fs::read_to_string(&output.snapshot).unwrap()).unwrap();
        assert_eq!(snapshot, doc);

        let table = std::fs::read_to_string(&output.table).unwrap();
        assert_eq!(table.lines().count(), 3);
        assert!(table.lines().nth(1).unwrap().starts_with("1,,joe,"));
    }

    #[test]
    fn records_without_apps_still_write_an_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let output = OutputFiles::new(dir.path());
        let doc = json!([
            {"id": 1, "elevatedApplications": []},
            {"id": 2}
        ]);

        let report = export(&log(doc.clone()), &output).unwrap();
        assert_eq!(report.records, 2);
        assert_eq!(report.rows, 0);
        assert!(report.table.is_ok());

        assert_eq!(std::fs::read_to_string(&output.table).unwrap(), "\r\n");
        let snapshot: Value =
            serde_json::from_str(&std::fs::read_to_string(&output.snapshot).unwrap()).unwrap();
        assert_eq!(snapshot, doc);
    }

    #[test]
    fn table_failure_is_recoverable() {
        let dir = tempfile::tempdir().unwrap();
        let output = OutputFiles {
            snapshot: dir.path().join("elevated_apps.json"),
            table: dir.path().join("missing").join("elevated_apps.csv"),
        };
        let doc = json!([{"id": 1, "elevatedApplications": [{"name": "a"}]}]);

        let report = export(&log(doc), &output).unwrap();
        assert!(output.snapshot.exists());
        assert!(matches!(report.table, Err(RecoverableError::NotFound { .. })));

        let err = report.strict().unwrap_err();
        assert!(matches!(err, RecoverableError::NotFound { .. }));
    }
}
