use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The record does not have the shape of a named two-line element set.
    #[error("malformed element record: {0}")]
    Malformed(String),
    /// The lines have the right shape but their content was rejected.
    #[error("invalid elements: {0}")]
    InvalidElements(String),
}
