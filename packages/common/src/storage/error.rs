use serde::Serialize;
use thiserror::Error;

/// Transport-visible classification of a store failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    BadRequest,
    Unauthorized,
    NotFound,
    Conflict,
    Internal,
}

/// Errors that can occur in any of the stores.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("user is blocked")]
    Blocked,

    #[error("post is read-only")]
    ReadOnly,

    #[error("duplicate comment id {0}")]
    Duplicate(String),

    #[error("edit window of {0}s has expired")]
    EditWindowExpired(u64),

    #[error("comment {0} is deleted")]
    Deleted(String),

    #[error("can't vote for own comment")]
    SelfVote,

    #[error("invalid request: {0}")]
    Invalid(String),

    #[error("image exceeds size limit ({actual} > {limit} bytes)")]
    TooLarge { actual: u64, limit: u64 },

    #[error("internal error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Blocked
            | Self::ReadOnly
            | Self::Duplicate(_)
            | Self::EditWindowExpired(_)
            | Self::Deleted(_)
            | Self::SelfVote => ErrorKind::Conflict,
            Self::Invalid(_) | Self::TooLarge { .. } => ErrorKind::BadRequest,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn poisoned(store: &str) -> Self {
        Self::Internal(format!("{store} lock poisoned"))
    }
}
