use thiserror::Error;

/// Failures reported by a [`Driver`](crate::browser::driver::Driver) implementation.
#[derive(Debug, Error)]
pub enum DriverError {
    /// No element matched the locator in the current frame context
    #[error("no such element: {0}")]
    NoSuchElement(String),

    /// Frame switch target was missing or detached
    #[error("no such frame: {0}")]
    NoSuchFrame(String),

    /// The session no longer exists, e.g. after its last window closed
    #[error("invalid session: {0}")]
    InvalidSession(String),

    /// Script evaluation threw inside the page
    #[error("script error: {0}")]
    Script(String),

    /// Driver answered with an error we don't map more precisely
    #[error("{command} failed: {message}")]
    Protocol { command: String, message: String },

    /// Transport failure talking to the WebDriver endpoint
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not have the expected shape
    #[error("JSON error ({context}): {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl DriverError {
    pub fn is_no_such_element(&self) -> bool {
        matches!(self, DriverError::NoSuchElement(_))
    }
}
