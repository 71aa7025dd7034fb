use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Caller errors
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Attribute is read-only: {0}")]
    ReadOnly(String),

    #[error("Not found: {0}")]
    NotFound(String),

    // Decoder state errors
    #[error("Resource busy: {0}")]
    Busy(String),

    #[error("Decoder not enabled")]
    NotEnabled,

    // Hardware errors
    #[error("Resource unavailable: {0}")]
    ResourceUnavailable(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create a busy error.
    pub fn busy(message: impl Into<String>) -> Self {
        Self::Busy(message.into())
    }

    /// Create a resource unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::ResourceUnavailable(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Returns `true` for [`Error::Busy`].
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
