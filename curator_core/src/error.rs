use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// No bracket-balanced or greedy span of the text parsed as JSON.
    #[error("no structured value recoverable from response: {preview}")]
    Unrecoverable { preview: String },

    #[error("expected {expected} in response, found {found}")]
    ShapeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("quorum threshold must be at least 1")]
    InvalidThreshold,
}
