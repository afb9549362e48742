use thiserror::Error;

use nest_notify::NotifyError;
use nest_patch::PatchError;
use nest_skiplist::SkipListError;
use nest_types::TypeError;

use crate::schema::ValidationError;

/// Errors produced by resource tree operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TreeError {
    /// Empty or reserved resource name.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// The path addresses the wrong kind of resource for the operation.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// A target resource or one of its ancestors does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A create-only resource already exists.
    #[error("already exists: {0}")]
    Conflict(String),

    /// The stored `lastModifiedAt` differs from the caller's expectation.
    #[error("pre-condition timestamp {expected} doesn't match current timestamp {actual}")]
    PreconditionFailed { expected: i64, actual: i64 },

    /// The document was rewritten between a patch's read and its write.
    #[error("document changed concurrently: read revision {expected}, now at revision {actual}")]
    RevisionChanged { expected: u64, actual: u64 },

    /// A body (or patched body) does not conform to the schema.
    #[error("document does not conform to schema: {0}")]
    SchemaInvalid(ValidationError),

    #[error("patch operation {index}: path {path} not found")]
    PatchTargetNotFound { index: usize, path: String },

    #[error("patch operation {index}: expected {expected} at {path}, found {found}")]
    PatchTypeMismatch {
        index: usize,
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("patch operation {index} is malformed: {reason}")]
    PatchMalformed { index: usize, reason: String },

    /// An invariant broke (poisoned lock, lost write result).
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<SkipListError> for TreeError {
    fn from(e: SkipListError) -> Self {
        match e {
            SkipListError::InvalidKey => Self::InvalidKey("name must not be empty".into()),
            SkipListError::Poisoned => Self::Internal(e.to_string()),
        }
    }
}

impl From<PatchError> for TreeError {
    fn from(e: PatchError) -> Self {
        match e {
            PatchError::Malformed { index, reason } => Self::PatchMalformed { index, reason },
            PatchError::TargetNotFound { index, path } => Self::PatchTargetNotFound { index, path },
            PatchError::TypeMismatch {
                index,
                path,
                expected,
                found,
            } => Self::PatchTypeMismatch {
                index,
                path,
                expected,
                found,
            },
        }
    }
}

impl From<TypeError> for TreeError {
    fn from(e: TypeError) -> Self {
        match e {
            TypeError::InvalidName { .. } => Self::InvalidKey(e.to_string()),
            TypeError::InvalidPath(reason) => Self::InvalidPath(reason),
        }
    }
}

impl From<NotifyError> for TreeError {
    fn from(e: NotifyError) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<ValidationError> for TreeError {
    fn from(e: ValidationError) -> Self {
        Self::SchemaInvalid(e)
    }
}

impl TreeError {
    /// Whether this is a structural or schema failure of a patch, as
    /// opposed to a missing document or an internal fault.
    pub fn is_patch_failure(&self) -> bool {
        matches!(
            self,
            Self::PatchTargetNotFound { .. }
                | Self::PatchTypeMismatch { .. }
                | Self::PatchMalformed { .. }
                | Self::SchemaInvalid(_)
        )
    }
}

/// Errors loading a schema file.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("schema is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unsupported schema: {0}")]
    Unsupported(String),
}

/// Convenience alias used throughout the tree crate.
pub type Result<T> = std::result::Result<T, TreeError>;
