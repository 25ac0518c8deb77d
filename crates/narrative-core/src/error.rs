use thiserror::Error;

/// Caller mistakes detected while validating share request parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing required parameter \"{0}\"")]
    MissingField(String),

    #[error("Invalid share level: {0}. Should be one of a, w, r.")]
    InvalidShareLevel(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("workspace service error: {0}")]
    Workspace(String),

    #[error("feeds service error: {0}")]
    Feeds(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Internal(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
