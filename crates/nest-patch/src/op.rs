use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PatchError, Result};

/// The three supported edit kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatchKind {
    ObjectAdd,
    ArrayAdd,
    ArrayRemove,
}

impl PatchKind {
    /// JSON type the target path must resolve to.
    pub fn expected_target(&self) -> &'static str {
        match self {
            Self::ObjectAdd => "object",
            Self::ArrayAdd | Self::ArrayRemove => "array",
        }
    }
}

impl fmt::Display for PatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ObjectAdd => "ObjectAdd",
            Self::ArrayAdd => "ArrayAdd",
            Self::ArrayRemove => "ArrayRemove",
        };
        write!(f, "{s}")
    }
}

impl FromStr for PatchKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "ObjectAdd" => Ok(Self::ObjectAdd),
            "ArrayAdd" => Ok(Self::ArrayAdd),
            "ArrayRemove" => Ok(Self::ArrayRemove),
            other => Err(format!("unknown op {other:?}")),
        }
    }
}

/// A decoded JSON-pointer path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct PatchPath {
    segments: Vec<String>,
}

impl PatchPath {
    /// Parse `""` (the root) or `/seg/seg…`, decoding `~1` and `~0`.
    pub fn parse(pointer: &str) -> std::result::Result<Self, String> {
        if pointer.is_empty() {
            return Ok(Self::default());
        }
        let Some(rest) = pointer.strip_prefix('/') else {
            return Err(format!("path {pointer:?} must start with '/'"));
        };
        let segments = rest.split('/').map(decode_segment).collect();
        Ok(Self { segments })
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Split off the last segment: `(parent, last)`.
    pub fn split_last(&self) -> Option<(Self, &str)> {
        let (last, parent) = self.segments.split_last()?;
        Some((
            Self {
                segments: parent.to_vec(),
            },
            last.as_str(),
        ))
    }
}

impl fmt::Display for PatchPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "/");
        }
        for segment in &self.segments {
            write!(f, "/{}", segment.replace('~', "~0").replace('/', "~1"))?;
        }
        Ok(())
    }
}

fn decode_segment(raw: &str) -> String {
    raw.replace("~1", "/").replace("~0", "~")
}

/// One edit: `{"op": ..., "path": ..., "value": ...}`.
///
/// For `ObjectAdd` the path names the new member; its parent must be an
/// object. For the array ops the path names the array itself.
#[derive(Clone, Debug, PartialEq)]
pub struct PatchOperation {
    pub kind: PatchKind,
    pub path: PatchPath,
    pub value: Value,
}

impl PatchOperation {
    pub fn new(kind: PatchKind, path: PatchPath, value: Value) -> Self {
        Self { kind, path, value }
    }

    /// Parse one operation object. `index` is reported in errors.
    pub fn from_json(index: usize, raw: &Value) -> Result<Self> {
        let malformed = |reason: String| PatchError::Malformed { index, reason };

        let Value::Object(fields) = raw else {
            return Err(malformed("operation is not an object".into()));
        };
        let kind = fields
            .get("op")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed("missing string field \"op\"".into()))?
            .parse::<PatchKind>()
            .map_err(malformed)?;
        let path = fields
            .get("path")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed("missing string field \"path\"".into()))?;
        let path = PatchPath::parse(path).map_err(malformed)?;
        let value = fields
            .get("value")
            .cloned()
            .ok_or_else(|| malformed("missing field \"value\"".into()))?;

        if kind == PatchKind::ObjectAdd && path.split_last().map_or(true, |(_, key)| key.is_empty()) {
            return Err(malformed("ObjectAdd path must end in a non-empty key".into()));
        }
        Ok(Self { kind, path, value })
    }
}

/// Parse a patch body: a JSON array of operation objects.
pub fn parse_patch(body: &Value) -> Result<Vec<PatchOperation>> {
    let Value::Array(items) = body else {
        return Err(PatchError::Malformed {
            index: 0,
            reason: "patch body must be an array of operations".into(),
        });
    };
    items
        .iter()
        .enumerate()
        .map(|(index, raw)| PatchOperation::from_json(index, raw))
        .collect()
}
