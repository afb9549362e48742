use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid resource name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    #[error("invalid resource path: {0}")]
    InvalidPath(String),
}
