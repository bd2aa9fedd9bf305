use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TrainerError {
    /// Range spec could not be parsed into two integers, or start > end.
    #[error("invalid range `{0}`")]
    InvalidRange(String),

    /// The selected range resolved to no keys.
    #[error("Select numbers!")]
    EmptyPool,

    /// The saved word edits could not be parsed and were discarded.
    #[error("saved word edits are malformed: {0}")]
    MalformedPersistedOverlay(String),
}

pub type Result<T> = std::result::Result<T, TrainerError>;
