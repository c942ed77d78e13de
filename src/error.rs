use thiserror::Error;

pub type Result<T> = std::result::Result<T, InspectError>;

#[derive(Error, Debug)]
pub enum InspectError {
    #[error("Editor not found: {0}")]
    EditorNotFound(String),
    #[error("Increment {index} out of range (timeline has {len})")]
    IncrementNotFound { index: usize, len: usize },
    #[error("Cannot merge timelines with increment sizes {expected}ms and {found}ms")]
    IncrementSizeMismatch { expected: i64, found: i64 },
    #[error("Invalid increment: {0}")]
    InvalidIncrement(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Source error: {0}")]
    Source(String),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),
}
