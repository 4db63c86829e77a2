//! Error types for oarss.

use thiserror::Error;

/// Common error type for oarss.
#[derive(Error, Debug)]
pub enum OarssError {
    /// No channel is stored under the given real identifier.
    #[error("channel {0} not found")]
    ChannelNotFound(String),

    /// No article is stored under the given id.
    #[error("article {0} not found")]
    ArticleNotFound(i64),

    /// A real identifier could not be extracted or resolved from the input.
    #[error("identifier not found: {0}")]
    IdentifierNotFound(String),

    /// The content provider call failed.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Feed document could not be rendered.
    #[error("render error: {0}")]
    Render(String),
}

/// Coarse failure classes used by callers that only care about recovery policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Requested channel, article or identifier does not exist.
    NotFound,
    /// The content provider failed.
    UpstreamFailure,
    /// Malformed input.
    ValidationFailure,
    /// Storage or other local failure.
    PersistenceFailure,
}

impl OarssError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            OarssError::ChannelNotFound(_)
            | OarssError::ArticleNotFound(_)
            | OarssError::IdentifierNotFound(_) => ErrorKind::NotFound,
            OarssError::Upstream(_) => ErrorKind::UpstreamFailure,
            OarssError::Validation(_) => ErrorKind::ValidationFailure,
            OarssError::Database(_)
            | OarssError::Io(_)
            | OarssError::Config(_)
            | OarssError::Render(_) => ErrorKind::PersistenceFailure,
        }
    }
}

impl From<sqlx::Error> for OarssError {
    fn from(e: sqlx::Error) -> Self {
        OarssError::Database(e.to_string())
    }
}

/// Result type alias for oarss operations.
pub type Result<T> = std::result::Result<T, OarssError>;
