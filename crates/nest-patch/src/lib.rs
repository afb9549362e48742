//! Structural JSON patch engine for NestDB.
//!
//! A patch is an ordered list of [`PatchOperation`]s. [`apply_patch`] walks
//! the document once per operation and rebuilds it, applying the edit where
//! the walk meets the target path. The input is never mutated: a failing
//! operation leaves the caller's document exactly as it was.
//!
//! Three operations are supported:
//!
//! - `ObjectAdd` — insert (or overwrite) a key in the object at the parent path
//! - `ArrayAdd` — append a value to the array at the path unless an equal one exists
//! - `ArrayRemove` — remove the first element equal to the value
//!
//! Paths are JSON-pointer style (`/a/b`, with `~1` for `/` and `~0` for `~`)
//! and descend through object members only.

pub mod engine;
pub mod error;
pub mod op;

pub use engine::{apply_operation, apply_patch, json_eq};
pub use error::PatchError;
pub use op::{parse_patch, PatchKind, PatchOperation, PatchPath};
