//! Concurrent ordered map for NestDB.
//!
//! [`ConcurrentSkipList`] is a lazy, lock-coupled skip list. Readers never
//! block: forward pointers are swapped atomically and nodes are reference
//! counted, so a traversal keeps every node it touches alive. Writers lock
//! only the handful of predecessor nodes they are about to relink, validate
//! that the neighbourhood is unchanged, and retry from scratch otherwise.
//!
//! # Key Types
//!
//! - [`ConcurrentSkipList`] — the map itself (`find`, `upsert`, `remove`, `query`)
//! - [`UpsertOutcome`] — whether an upsert created or updated its key
//! - [`SkipListConfig`] — tower height limit
//! - [`SkipListError`] — invalid keys and poisoned node locks

pub mod config;
pub mod error;
pub mod list;
mod node;

pub use config::SkipListConfig;
pub use error::SkipListError;
pub use list::{ConcurrentSkipList, UpsertOutcome};
