//!
//! Audit log records returned by the `auditlog` API.
//!
//! NOTE: Only the fields exported to CSV are modelled, everything else is kept
//! in the raw document.
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::Result;

/// User that requested the elevation
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct User {
    /// Account name
    pub account: Option<Value>,
}

/// Computer the elevation happened on
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Computer {
    /// Computer name
    pub name: Option<Value>,
    /// Operating system platform
    pub platform: Option<Value>,
}

/// Application that triggered the request
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Application {
    /// Application name
    pub name: Option<Value>,
}

/// Application run with elevated privileges
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ElevatedApp {
    pub name: Option<Value>,
    pub path: Option<Value>,
    pub file: Option<Value>,
    pub version: Option<Value>,
    pub vendor: Option<Value>,
    /// Malware scan verdict
    pub scan_result: Option<Value>,
    pub virustotal_link: Option<Value>,
}

/// One elevation event
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub id: Option<Value>,
    pub trace_no: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub user: Option<User>,
    #[serde(default, deserialize_with = "lenient")]
    pub computer: Option<Computer>,
    pub status: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub application: Option<Application>,
    pub request_time: Option<Value>,
    #[serde(default, deserialize_with = "lenient_apps")]
    elevated_applications: Option<Vec<ElevatedApp>>,
}

impl AuditRecord {
    /// Elevated applications in API order, empty when absent
    #[must_use]
    pub fn elevated_applications(&self) -> &[ElevatedApp] {
        self.elevated_applications.as_deref().unwrap_or_default()
    }
}

/// Nested values of an unexpected shape are treated as absent
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    match serde_json::from_value(value) {
        Ok(v) => Ok(Some(v)),
        Err(e) => {
            tracing::warn!("Ignoring malformed audit log field: {}", e);
            Ok(None)
        }
    }
}

/// Entries are decoded one by one, an entry that is not an object becomes an
/// application with every field absent
fn lenient_apps<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<ElevatedApp>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(entries) = lenient::<D, Vec<Value>>(deserializer)? else {
        return Ok(None);
    };
    let apps = entries
        .into_iter()
        .map(|entry| {
            if !entry.is_object() {
                if !entry.is_null() {
                    tracing::warn!("Ignoring malformed elevated application: {}", entry);
                }
                return ElevatedApp::default();
            }
            serde_json::from_value(entry).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed elevated application: {}", e);
                ElevatedApp::default()
            })
        })
        .collect();
    Ok(Some(apps))
}

/// A decoded `auditlog` response
#[derive(Clone, Debug)]
pub struct AuditLog {
    raw: Value,
    records: Vec<AuditRecord>,
}

impl AuditLog {
    /// Parse a decoded response.
    ///
    /// Empty documents (`null`, `[]`, `{}`, `""`, `0`, `false`) yield `None`.
    /// Anything else must be an array of record objects.
    pub fn from_value(raw: Value) -> Result<Option<Self>> {
        if is_empty_document(&raw) {
            return Ok(None);
        }
        let records = Vec::<AuditRecord>::deserialize(&raw)?;
        tracing::debug!("Decoded {} audit log records", records.len());
        Ok(Some(Self { raw, records }))
    }

    /// Document as returned by the API
    #[must_use]
    pub const fn raw(&self) -> &Value {
        &self.raw
    }

    /// Typed records, in API order
    #[must_use]
    pub fn records(&self) -> &[AuditRecord] {
        &self.records
    }
}

fn is_empty_document(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}
