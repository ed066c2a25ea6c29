use thiserror::Error;

/// Startup-fatal configuration errors: environment, catalog I/O, and
/// catalog validation. Nothing downstream runs until these are resolved.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read supplier catalog {path}: {source}")]
    CatalogIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse supplier catalog {path}: {source}")]
    CatalogParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid supplier catalog: {0}")]
    Validation(String),
}

/// Why a single scenario entry was rejected. Rejections are reported to the
/// caller and logged there; they never abort a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScenarioError {
    #[error("scenario {entry} is not an object")]
    NotAnObject { entry: String },

    #[error("scenario {entry} has no `url`")]
    MissingUrl { entry: String },

    #[error("scenario {entry} has an invalid url \"{url}\"")]
    InvalidUrl { entry: String, url: String },

    #[error("scenario {entry} has an invalid category id: {reason}")]
    InvalidCategory { entry: String, reason: String },

    #[error("scenario {entry} could not be decoded: {reason}")]
    Malformed { entry: String, reason: String },
}
