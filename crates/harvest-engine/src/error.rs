use thiserror::Error;

/// Errors surfaced by a [`crate::Driver`].
///
/// Misses are not errors: a locator that finds nothing resolves to
/// `Ok(None)`. Only [`DriverError::is_fatal`] variants abort a run; the rest
/// are recovered at field level.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("browser session lost: {reason}")]
    Session { reason: String },

    #[error("{command} failed with \"{error}\": {message}")]
    Remote {
        command: String,
        error: String,
        message: String,
    },

    #[error("{context} timed out")]
    Timeout { context: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl DriverError {
    /// `true` for transport and session failures that make every following
    /// command pointless.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DriverError::Http(_) | DriverError::Session { .. } | DriverError::Deserialize { .. }
        )
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error("supplier catalog cannot drive extraction: {reason}")]
    Catalog { reason: String },

    #[error("failed to write records to {path}: {source}")]
    SinkIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize records: {0}")]
    SinkSerialize(#[from] serde_json::Error),
}
