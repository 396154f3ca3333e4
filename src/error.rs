use thiserror::Error;

use crate::types::TicketId;

/// The three failure classes the board surfaces to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected locally before any network call
    Validation,
    /// Role insufficient, either detected locally or reported as 401/403
    Authorization,
    /// Network or server failure on an otherwise valid request
    Fetch,
}

#[derive(Error, Debug)]
pub enum BoardError {
    #[error("{0}")]
    Validation(String),

    #[error("not authorized: {0}")]
    Authorization(String),

    #[error("request failed: {0}")]
    Fetch(String),

    #[error("ticket #{0} not found on this board")]
    TicketNotFound(TicketId),

    #[error("ticket #{0} already has a change in flight")]
    MutationPending(TicketId),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl BoardError {
    /// Classify the error into the user-facing taxonomy.
    ///
    /// Local bookkeeping failures (unknown ticket, pending mutation, bad
    /// config) count as validation: nothing was sent to the server.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BoardError::Validation(_)
            | BoardError::TicketNotFound(_)
            | BoardError::MutationPending(_)
            | BoardError::Config(_)
            | BoardError::YamlParse(_) => ErrorKind::Validation,
            BoardError::Authorization(_) => ErrorKind::Authorization,
            BoardError::Fetch(_) | BoardError::Io(_) | BoardError::Json(_) | BoardError::Http(_) => {
                ErrorKind::Fetch
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, BoardError>;
