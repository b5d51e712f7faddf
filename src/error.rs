use thiserror::Error;

/// Everything that can end a `/generate` request early.
///
/// All variants are terminal: nothing is retried or queued.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The upload itself was unusable (no file, empty filename, bad extension).
    #[error("{0}")]
    Validation(String),

    /// A key or endpoint the selected backend needs is missing.
    #[error("{0}")]
    Config(String),

    /// The backend answered with a non-success status. `body` is kept verbatim.
    #[error("API Error: {body}")]
    Api { status: u16, body: String },

    /// Transport, IO or decoding failure.
    #[error("{0}")]
    Unhandled(String),
}

impl GenerationError {
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::Validation(_) => "validation",
            GenerationError::Config(_) => "config",
            GenerationError::Api { .. } => "api",
            GenerationError::Unhandled(_) => "unhandled",
        }
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        GenerationError::Unhandled(err.to_string())
    }
}

impl From<serde_json::Error> for GenerationError {
    fn from(err: serde_json::Error) -> Self {
        GenerationError::Unhandled(err.to_string())
    }
}

impl From<std::io::Error> for GenerationError {
    fn from(err: std::io::Error) -> Self {
        GenerationError::Unhandled(err.to_string())
    }
}

/// Raised while reading configuration at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}
