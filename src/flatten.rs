//!
//! Flatten audit records into one row per elevated application.
//!
use serde_json::Value;

use crate::auditlog::{AuditRecord, ElevatedApp};

/// A record's base fields joined with one of its elevated applications.
///
/// Absent values are `None` and exported as empty cells.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FlatRow {
    pub id: Option<Value>,
    pub trace_no: Option<Value>,
    pub user_account: Option<Value>,
    pub computer_name: Option<Value>,
    pub platform: Option<Value>,
    pub status: Option<Value>,
    pub application_name: Option<Value>,
    pub request_time: Option<Value>,
    pub app_name: Option<Value>,
    pub app_path: Option<Value>,
    pub app_file: Option<Value>,
    pub app_version: Option<Value>,
    pub vendor: Option<Value>,
    pub scan_result: Option<Value>,
    pub virustotal_link: Option<Value>,
}

impl FlatRow {
    /// Column names, in the order of [`FlatRow::values`]
    pub const COLUMNS: [&'static str; 15] = [
        "id",
        "traceNo",
        "user_account",
        "computer_name",
        "platform",
        "status",
        "application_name",
        "requestTime",
        "app_name",
        "app_path",
        "app_file",
        "app_version",
        "vendor",
        "scanResult",
        "virustotalLink",
    ];

    /// Base fields of `record`, with no application
    #[must_use]
    pub fn base(record: &AuditRecord) -> Self {
        Self {
            id: record.id.clone(),
            trace_no: record.trace_no.clone(),
            user_account: record.user.as_ref().and_then(|u| u.account.clone()),
            computer_name: record.computer.as_ref().and_then(|c| c.name.clone()),
            platform: record.computer.as_ref().and_then(|c| c.platform.clone()),
            status: record.status.clone(),
            application_name: record.application.as_ref().and_then(|a| a.name.clone()),
            request_time: record.request_time.clone(),
            ..Self::default()
        }
    }

    /// Copy of this row for one elevated application
    #[must_use]
    pub fn with_app(&self, app: &ElevatedApp) -> Self {
        Self {
            app_name: app.name.clone(),
            app_path: app.path.clone(),
            app_file: app.file.clone(),
            app_version: app.version.clone(),
            vendor: app.vendor.clone(),
            scan_result: app.scan_result.clone(),
            virustotal_link: app.virustotal_link.clone(),
            ..self.clone()
        }
    }

    /// Columns of this row
    #[must_use]
    pub const fn columns(&self) -> &'static [&'static str] {
        &Self::COLUMNS
    }

    /// Cell values, in column order
    #[must_use]
    pub fn values(&self) -> [Option<&Value>; 15] {
        [
            self.id.as_ref(),
            self.trace_no.as_ref(),
            self.user_account.as_ref(),
            self.computer_name.as_ref(),
            self.platform.as_ref(),
            self.status.as_ref(),
            self.application_name.as_ref(),
            self.request_time.as_ref(),
            self.app_name.as_ref(),
            self.app_path.as_ref(),
            self.app_file.as_ref(),
            self.app_version.as_ref(),
            self.vendor.as_ref(),
            self.scan_result.as_ref(),
            self.virustotal_link.as_ref(),
        ]
    }
}

/// One row per (record, elevated application), in record then application
/// order. Records without elevated applications produce no rows.
#[must_use]
pub fn flatten(records: &[AuditRecord]) -> Vec<FlatRow> {
    records
        .iter()
        .flat_map(|record| {
            let base = FlatRow::base(record);
            record
                .elevated_applications()
                .iter()
                .map(move |app| base.with_app(app))
        })
        .collect()
}

/// Header for `rows`: the columns of the first row, empty when there are none.
///
/// Later rows are not consulted.
#[must_use]
pub fn columns(rows: &[FlatRow]) -> &'static [&'static str] {
    match rows.first() {
        Some(row) => row.columns(),
        None => &[],
    }
}
