use thiserror::Error;

/// Errors produced while delivering or rendering events.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// The listener's receiving side has gone away.
    #[error("listener closed")]
    ListenerClosed,

    /// The subscribed resource has been deleted.
    #[error("resource no longer accepts subscribers")]
    Closed,

    /// A subscriber set's lock was poisoned by a panicking thread.
    #[error("subscriber set lock poisoned")]
    Poisoned,

    /// An event payload could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias used throughout the notify crate.
pub type Result<T> = std::result::Result<T, NotifyError>;
