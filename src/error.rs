use std::time::Duration;

use thiserror::Error;

use crate::browser::error::DriverError;

/// Errors surfaced by the scan and interaction operations.
///
/// Classification, diffing and compatibility analysis never fail, so they
/// have no variants here.
#[derive(Debug, Error)]
pub enum PageError {
    /// Script injection/evaluation failed or the page was not stable
    #[error("scan failed: {reason}")]
    ScanFailure {
        reason: String,
        #[source]
        source: Option<DriverError>,
    },

    /// Every applicable resolver strategy was exhausted
    #[error("element '{target}' not found (tried: {})", .attempted.join(", "))]
    ElementNotFound {
        target: String,
        attempted: Vec<String>,
    },

    /// Post-login condition never appeared within budget
    #[error("login did not complete within {timeout:?}: expected {expected}, observed url {observed}")]
    LoginTimeout {
        expected: String,
        observed: String,
        timeout: Duration,
    },

    #[error("navigation to {url} did not complete within {timeout:?}")]
    NavigationTimeout { url: String, timeout: Duration },

    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error("config error: {0}")]
    Config(String),
}

impl PageError {
    pub fn scan_failure(reason: impl Into<String>) -> Self {
        PageError::ScanFailure {
            reason: reason.into(),
            source: None,
        }
    }

    pub fn scan_failure_from(reason: impl Into<String>, source: DriverError) -> Self {
        PageError::ScanFailure {
            reason: reason.into(),
            source: Some(source),
        }
    }
}
