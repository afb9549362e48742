//! Hierarchical resource paths.
//!
//! A path is a non-empty sequence of already-decoded name segments. The
//! hierarchy strictly alternates kinds, so the kind of the addressed
//! resource follows from the segment count alone:
//!
//! | segments | kind       |
//! |----------|------------|
//! | 1        | database   |
//! | even     | document   |
//! | odd ≥ 3  | collection |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::name::validate_name;

/// The three node kinds of the resource hierarchy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Database,
    Document,
    Collection,
}

impl ResourceKind {
    /// Returns `true` for kinds whose children are documents.
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Database | Self::Collection)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Database => "database",
            Self::Document => "document",
            Self::Collection => "collection",
        };
        write!(f, "{s}")
    }
}

/// A decoded, validated path to a resource.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourcePath {
    segments: Vec<String>,
}

impl ResourcePath {
    /// Build a path from decoded segments.
    pub fn new<I, S>(segments: I) -> Result<Self, TypeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(TypeError::InvalidPath("path has no segments".into()));
        }
        for segment in &segments {
            validate_name(segment)?;
        }
        Ok(Self { segments })
    }

    /// Path of a top-level database.
    pub fn database(name: &str) -> Result<Self, TypeError> {
        Self::new([name])
    }

    /// Parse a `/`-separated path such as `/db/doc/col/`.
    ///
    /// A single leading and a single trailing slash are ignored. Segments are
    /// taken verbatim; percent-decoding is the caller's job.
    pub fn parse(path: &str) -> Result<Self, TypeError> {
        let trimmed = path.strip_prefix('/').unwrap_or(path);
        let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Err(TypeError::InvalidPath(format!("{path:?} is empty")));
        }
        if trimmed.split('/').any(str::is_empty) {
            return Err(TypeError::InvalidPath(format!(
                "{path:?} contains an empty segment"
            )));
        }
        Self::new(trimmed.split('/'))
    }

    /// The decoded segments, root first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments (always at least one).
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always `false`; paths have at least one segment.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Kind of the resource this path addresses.
    pub fn kind(&self) -> ResourceKind {
        match self.segments.len() {
            1 => ResourceKind::Database,
            n if n % 2 == 0 => ResourceKind::Document,
            _ => ResourceKind::Collection,
        }
    }

    /// Final segment: the resource's own name.
    pub fn name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Name of the database this path lives in.
    pub fn database_name(&self) -> &str {
        self.segments.first().map(String::as_str).unwrap_or_default()
    }

    /// The path below the database, e.g. `/doc/col/doc2` for
    /// `/db/doc/col/doc2`. A database itself renders as `/`.
    pub fn within_database(&self) -> String {
        if self.segments.len() <= 1 {
            return "/".to_string();
        }
        self.segments[1..]
            .iter()
            .map(|segment| format!("/{segment}"))
            .collect()
    }

    /// Path of the parent resource, or `None` for a database.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.len() <= 1 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Path of a named child of this resource.
    pub fn child(&self, name: &str) -> Result<Self, TypeError> {
        validate_name(name)?;
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Ok(Self { segments })
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}
