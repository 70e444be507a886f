/// Fetch status of a URL record
use std::fmt;

/// Lifecycle of a URL record
///
/// Every record starts `Pending` and moves to exactly one terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchStatus {
    /// Discovered, not yet fetched
    Pending,

    /// Fetched successfully; counts against the page budget
    Fetched,

    /// Fetch failed (HTTP error, network error, timeout, unusable content)
    Failed,

    /// Dispatched but its result was discarded because the crawl stopped
    Skipped,
}

impl FetchStatus {
    /// Returns true if no further transition is allowed
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Converts the status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetched => "fetched",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }

    /// Parses a status from its database string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "fetched" => Some(Self::Fetched),
            "failed" => Some(Self::Failed),
            "skipped" => Some(Self::Skipped),
            _ => None,
        }
    }

    /// Returns all statuses
    pub fn all_statuses() -> [Self; 4] {
        [Self::Pending, Self::Fetched, Self::Failed, Self::Skipped]
    }
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
