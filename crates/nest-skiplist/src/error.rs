use thiserror::Error;

/// Errors produced by skip-list operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SkipListError {
    /// The key sorts at or below the list's lower bound (`K::default()`).
    #[error("key sorts at or below the list's lower bound")]
    InvalidKey,

    /// A node lock was poisoned by a panicking writer.
    #[error("skip list node lock poisoned")]
    Poisoned,
}

/// Convenience alias used throughout the skip-list crate.
pub type Result<T> = std::result::Result<T, SkipListError>;
