//!
//! Library for exporting Admin By Request audit logs.
//!
//! ## Fetching
//! A [`Config`] names the data center, the API key and the retrieval window.
//! The [`Client`] issues a single authenticated request for it.
//! ```no_run
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), abr_auditlog::FatalError> {
//!     use abr_auditlog::{Client, Config};
//!
//!     let config = Config::new(std::env::var("API_KEY").ok().as_deref())?
//!         .with_days(30)
//!         .with_entries(500);
//!     let client = Client::new(config)?;
//!
//!     match client.fetch_audit_log().await? {
//!         Some(log) => println!("{} records", log.records().len()),
//!         None => println!("no audit logs"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Exporting
//! [`run`] fetches, saves the raw JSON, flattens the records to one row per
//! elevated application and writes the CSV.
//! ```no_run
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), abr_auditlog::FatalError> {
//!     use abr_auditlog::{Client, Config, OutputFiles};
//!
//!     let client = Client::new(Config::new(Some("secret"))?)?;
//!     if let Some(report) = abr_auditlog::run(&client, &OutputFiles::new(".")).await? {
//!         // Write failures are not fatal unless asked for
//!         let report = report.strict().expect("CSV written");
//!         println!("{} rows", report.rows);
//!     }
//!     Ok(())
//! }
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
use std::path::{Path, PathBuf};

pub mod auditlog;
pub mod config;
pub mod flatten;
pub mod output;
pub mod pipeline;

pub use auditlog::{AuditLog, AuditRecord, ElevatedApp};
pub use config::{ApiKey, Config, Datacenter};
pub use flatten::{columns, flatten, FlatRow};
pub use output::{write_snapshot, write_table, OutputFiles};
pub use pipeline::{export, run, Report};

/// Error that ends a run
#[derive(Debug, thiserror::Error)]
pub enum FatalError {
    /// Missing or invalid configuration, no request has been made
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// URL parsing error
    #[error("URL: {0}")]
    Url(#[from] url::ParseError),

    /// The request could not be sent or the response could not be read
    #[error("Error fetching audit logs: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non success status returned by the HTTP server
    #[error("HTTP failed {0}, {1}")]
    Status(u16, String),

    /// The response is not an audit log document
    #[error("Failed to decode audit logs: {0}")]
    Decode(#[from] serde_json::Error),

    /// The raw JSON snapshot could not be written
    #[error("Failed to write {path}: {source}")]
    Snapshot {
        /// Snapshot path
        path: PathBuf,
        /// Cause
        source: std::io::Error,
    },
}

impl FatalError {
    /// Create a configuration error
    #[must_use]
    pub fn configuration(err: &str) -> Self {
        Self::Configuration(err.to_string())
    }

    /// Process exit status for this error
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Configuration(_) => 2,
            _ => 1,
        }
    }
}

/// Error writing the CSV table. The run still completes.
#[derive(Debug, thiserror::Error)]
pub enum RecoverableError {
    /// A directory in the path does not exist
    #[error("File not found: {path}: {source}")]
    NotFound {
        /// Output path
        path: PathBuf,
        /// Cause
        source: std::io::Error,
    },

    /// No write access
    #[error("Permission denied: {path}: {source}")]
    PermissionDenied {
        /// Output path
        path: PathBuf,
        /// Cause
        source: std::io::Error,
    },

    /// The output path is a directory
    #[error("Expected a file but found a directory: {path}: {source}")]
    IsADirectory {
        /// Output path
        path: PathBuf,
        /// Cause
        source: std::io::Error,
    },

    /// Any other OS level error
    #[error("OS error: {path}: {source}")]
    Io {
        /// Output path
        path: PathBuf,
        /// Cause
        source: std::io::Error,
    },

    /// CSV encoding error
    #[error("CSV error: {path}: {source}")]
    Csv {
        /// Output path
        path: PathBuf,
        /// Cause
        source: csv::Error,
    },
}

impl RecoverableError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        let path = path.to_path_buf();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound { path, source },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path, source },
            std::io::ErrorKind::IsADirectory => Self::IsADirectory { path, source },
            _ => Self::Io { path, source },
        }
    }

    pub(crate) fn csv(path: &Path, source: csv::Error) -> Self {
        let io_kind = match source.kind() {
            csv::ErrorKind::Io(err) => Some(err.kind()),
            _ => None,
        };
        match io_kind {
            Some(kind) => Self::io(path, std::io::Error::new(kind, source.to_string())),
            None => Self::Csv {
                path: path.to_path_buf(),
                source,
            },
        }
    }

    /// Path that failed to be written
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound { path, .. }
            | Self::PermissionDenied { path, .. }
            | Self::IsADirectory { path, .. }
            | Self::Io { path, .. }
            | Self::Csv { path, .. } => path,
        }
    }
}

/// Result type
pub type Result<T> = std::result::Result<T, FatalError>;

/// The `Client` retrieves audit logs for one [`Config`].
#[derive(Clone, Debug)]
pub struct Client {
    config: Config,
    endpoint: url::Url,
    client: reqwest::Client,
}

impl Client {
    /// Create a client, the endpoint is resolved from the configuration
    pub fn new(config: Config) -> Result<Self> {
        let endpoint = config.endpoint()?;
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            config,
            endpoint,
            client,
        })
    }

    /// Configuration the client was created with
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Full request URL, including the query
    #[must_use]
    pub const fn endpoint(&self) -> &url::Url {
        &self.endpoint
    }

    /// GET the audit log.
    ///
    /// Returns `None` when the API answers with an empty document.
    pub async fn fetch_audit_log(&self) -> Result<Option<AuditLog>> {
        tracing::debug!("GET {}", self.endpoint);

        let result = self
            .client
            .get(self.endpoint.clone())
            .header("apikey", self.config.api_key().expose())
            .header("Content-Type", "application/csv")
            .send()
            .await?;

        let status = result.status();
        if !status.is_success() {
            let text = result.text().await.unwrap_or_default();
            tracing::debug!("auditlog returned {}", text);
            return Err(FatalError::Status(
                status.as_u16(),
                status.canonical_reason().unwrap_or_default().to_string(),
            ));
        }

        let body = result.bytes().await?;
        tracing::info!("Successfully retrieved audit logs.");

        let document = match serde_json::from_slice::<serde_json::Value>(&body) {
            Ok(document) => document,
            // An empty body is an empty document
            Err(e) if e.is_eof() && body.iter().all(u8::is_ascii_whitespace) => {
                serde_json::Value::Null
            }
            Err(e) => return Err(e.into()),
        };

        AuditLog::from_value(document)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn exit_codes() {
        assert_eq!(FatalError::configuration("no key").exit_code(), 2);
        assert_eq!(FatalError::Status(500, "boom".into()).exit_code(), 1);
    }

    #[test]
    fn io_errors_are_classified() {
        let path = Path::new("out.csv");
        let err = RecoverableError::io(path, std::io::ErrorKind::NotFound.into());
        assert!(matches!(err, RecoverableError::NotFound { .. }));
        assert!(err.to_string().starts_with("File not found"));

        let err = RecoverableError::io(path, std::io::ErrorKind::PermissionDenied.into());
        assert!(matches!(err, RecoverableError::PermissionDenied { .. }));

        let err = RecoverableError::io(path, std::io::ErrorKind::IsADirectory.into());
        assert!(matches!(err, RecoverableError::IsADirectory { .. }));
        assert!(err
            .to_string()
            .starts_with("Expected a file but found a directory"));

        let err = RecoverableError::io(path, std::io::ErrorKind::WriteZero.into());
        assert!(matches!(err, RecoverableError::Io { .. }));
        assert_eq!(err.path(), path);
    }

    #[test]
    fn csv_io_errors_are_classified_as_io() {
        let source = csv::Error::from(std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        let err = RecoverableError::csv(Path::new("out.csv"), source);
        assert!(matches!(err, RecoverableError::PermissionDenied { .. }));
    }

    #[test]
    fn client_resolves_endpoint() {
        let config = Config::new(Some("secret")).unwrap().with_days(7);
        let client = Client::new(config).unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            "https://dc2api.adminbyrequest.com/auditlog?days=7&take=10000"
        );
        assert_eq!(client.config().days, 7);
    }
}
