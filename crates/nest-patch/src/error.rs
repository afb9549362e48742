use thiserror::Error;

/// Errors produced while parsing or applying a patch.
///
/// Every variant carries the zero-based index of the offending operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PatchError {
    /// The operation object is missing a field or names an unknown op.
    #[error("operation {index}: malformed: {reason}")]
    Malformed { index: usize, reason: String },

    /// No node in the document sits at the operation's path.
    #[error("operation {index}: path {path} not found")]
    TargetNotFound { index: usize, path: String },

    /// The node at the path has the wrong JSON type for the operation.
    #[error("operation {index}: expected {expected} at {path}, found {found}")]
    TypeMismatch {
        index: usize,
        path: String,
        expected: &'static str,
        found: &'static str,
    },
}

impl PatchError {
    /// Index of the operation that failed.
    pub fn index(&self) -> usize {
        match self {
            Self::Malformed { index, .. }
            | Self::TargetNotFound { index, .. }
            | Self::TypeMismatch { index, .. } => *index,
        }
    }
}

/// Convenience alias used throughout the patch crate.
pub type Result<T> = std::result::Result<T, PatchError>;
