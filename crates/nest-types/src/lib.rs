//! Foundation types for NestDB.
//!
//! This crate provides the small value types shared by every other NestDB
//! crate: how a resource is addressed, what metadata it carries, and how it
//! is rendered back to clients.
//!
//! # Key Types
//!
//! - [`ResourcePath`] — decoded segment path (`db / doc / col / doc …`)
//! - [`ResourceKind`] — database, document, or collection
//! - [`Metadata`] — creation/modification timestamps and principals
//! - [`Representation`] — canonical `{path, doc, meta}` rendering of a document
//! - [`validate_name`] / [`random_name`] — resource key rules

pub mod clock;
pub mod error;
pub mod metadata;
pub mod name;
pub mod path;

pub use clock::now_millis;
pub use error::TypeError;
pub use metadata::{Metadata, Representation};
pub use name::{random_name, validate_name, NAME_ALPHABET};
pub use path::{ResourceKind, ResourcePath};
