//! The NestDB resource tree.
//!
//! Resources form a strictly alternating hierarchy:
//!
//! ```text
//! database ─┬─ document ─┬─ collection ─┬─ document ─ …
//!           │            └─ collection   └─ document
//!           └─ document
//! ```
//!
//! Every container level keeps its children in a
//! [`ConcurrentSkipList`](nest_skiplist::ConcurrentSkipList), so requests on
//! different resources never contend on a shared lock. Writes are
//! create-or-replace with an optional timestamp precondition; patches are
//! optimistic and retried when they lose a race.
//!
//! # Key Types
//!
//! - [`ResourceTree`] — the root: databases plus path-based operations
//! - [`Database`], [`Document`], [`Collection`] — the three node kinds
//! - [`DocumentContainer`] — shared child operations of databases and collections
//! - [`SchemaValidator`] — pluggable body validation ([`AllowAll`], [`JsonSchema`])
//! - [`TreeError`] — the failure taxonomy callers map to responses

pub mod collection;
pub mod config;
pub mod container;
pub mod database;
pub mod document;
pub mod error;
pub mod schema;
pub mod tree;

pub use collection::Collection;
pub use config::{TreeConfig, TreeEnv};
pub use container::{DocumentContainer, Precondition, PutOutcome, PutResult, WriteMode};
pub use database::Database;
pub use document::Document;
pub use error::{SchemaError, TreeError};
pub use schema::{AllowAll, JsonSchema, SchemaValidator, ValidationError};
pub use tree::{Container, Resource, ResourceTree};
