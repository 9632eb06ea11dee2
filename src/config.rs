//!
//! Retrieval configuration, built once at startup.
//!
use crate::{FatalError, Result};

/// Data center used when none is configured
pub const DEFAULT_DATACENTER: &str = "dc2";
/// Default lookback window in days
pub const DEFAULT_DAYS: u32 = 365;
/// Default maximum number of entries
pub const DEFAULT_ENTRIES: u32 = 10_000;

const AUDITLOG_PATH: &str = "auditlog";

/// Admin By Request data center, `dc1` (EU), `dc2` (US) and so on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Datacenter(String);

impl Datacenter {
    /// Data center name, e.g. `dc1`
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Host serving the API of this data center
    #[must_use]
    pub fn api_host(&self) -> String {
        format!("{}api.adminbyrequest.com", self.0)
    }
}

impl Default for Datacenter {
    fn default() -> Self {
        Self(DEFAULT_DATACENTER.to_string())
    }
}

impl std::str::FromStr for Datacenter {
    type Err = FatalError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let dc = s.trim().to_ascii_lowercase();
        let valid = dc
            .strip_prefix("dc")
            .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()));
        if valid {
            Ok(Self(dc))
        } else {
            Err(FatalError::Configuration(format!(
                "invalid data center '{s}', expected dc1, dc2, ..."
            )))
        }
    }
}

impl std::fmt::Display for Datacenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// API key sent in the `apikey` header
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    /// Blank keys are rejected
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(FatalError::configuration("API_KEY is empty."));
        }
        Ok(Self(key))
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Parameters of a single audit log retrieval
#[derive(Clone, Debug)]
pub struct Config {
    /// Data center to connect to
    pub datacenter: Datacenter,
    api_key: ApiKey,
    /// Number of days to retrieve logs for
    pub days: u32,
    /// Maximum number of entries to retrieve
    pub entries: u32,
    /// Replaces the data center host, mostly for testing
    pub base_url: Option<url::Url>,
}

impl Config {
    /// Create a configuration with the default data center and window.
    ///
    /// Fails when no API key is provided.
    pub fn new(api_key: Option<&str>) -> Result<Self> {
        let api_key =
            api_key.ok_or_else(|| FatalError::configuration("API_KEY environment variable not set."))?;
        Ok(Self {
            datacenter: Datacenter::default(),
            api_key: ApiKey::new(api_key)?,
            days: DEFAULT_DAYS,
            entries: DEFAULT_ENTRIES,
            base_url: None,
        })
    }

    /// Select the data center
    #[must_use]
    pub fn with_datacenter(self, datacenter: Datacenter) -> Self {
        Self { datacenter, ..self }
    }

    /// Set the lookback window
    #[must_use]
    pub fn with_days(self, days: u32) -> Self {
        Self { days, ..self }
    }

    /// Set the maximum number of entries
    #[must_use]
    pub fn with_entries(self, entries: u32) -> Self {
        Self { entries, ..self }
    }

    /// Send requests to `base_url` instead of the data center host
    #[must_use]
    pub fn with_base_url(self, base_url: Option<url::Url>) -> Self {
        Self { base_url, ..self }
    }

    /// API key
    #[must_use]
    pub const fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    /// Audit log URL with the `days` and `take` query parameters
    pub fn endpoint(&self) -> Result<url::Url> {
        let base = match &self.base_url {
            Some(base) => base.clone(),
            None => url::Url::parse(&format!("https://{}/", self.datacenter.api_host()))?,
        };
        let mut url = base.join(AUDITLOG_PATH)?;
        url.query_pairs_mut()
            .append_pair("days", &self.days.to_string())
            .append_pair("take", &self.entries.to_string());
        Ok(url)
    }
}
