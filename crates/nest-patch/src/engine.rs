use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{PatchError, Result};
use crate::op::{PatchKind, PatchOperation};

/// The edit being applied, resolved from a [`PatchOperation`].
struct Edit<'a> {
    kind: PatchKind,
    /// Path of the container the edit lands in.
    target: &'a [String],
    /// Member name for `ObjectAdd`.
    key: Option<&'a str>,
    value: &'a Value,
}

/// Walk position, passed by value so every branch starts from its own copy.
#[derive(Clone, Copy)]
struct Cursor {
    depth: usize,
    on_path: bool,
}

impl Cursor {
    fn root() -> Self {
        Self {
            depth: 0,
            on_path: true,
        }
    }

    fn at_target(&self, edit: &Edit<'_>) -> bool {
        self.on_path && self.depth == edit.target.len()
    }

    fn member(&self, key: &str, edit: &Edit<'_>) -> Self {
        Self {
            depth: self.depth + 1,
            on_path: self.on_path && edit.target.get(self.depth).is_some_and(|seg| seg == key),
        }
    }

    fn element(&self) -> Self {
        Self {
            depth: self.depth + 1,
            on_path: false,
        }
    }
}

/// What the walk found at the target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Hit {
    Missed,
    Applied,
    Mismatch(&'static str),
}

impl Hit {
    fn or(self, other: Hit) -> Hit {
        match self {
            Hit::Missed => other,
            hit => hit,
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// JSON equality with numbers compared by value, so `1` equals `1.0`.
pub fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| json_eq(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| json_eq(x, y)))
        }
        _ => a == b,
    }
}

fn walk(value: &Value, cursor: Cursor, edit: &Edit<'_>) -> (Value, Hit) {
    let at_target = cursor.at_target(edit);
    match value {
        Value::Object(members) => {
            let mut hit = Hit::Missed;
            let mut out = Map::new();
            for (key, child) in members {
                let (child, child_hit) = walk(child, cursor.member(key, edit), edit);
                hit = hit.or(child_hit);
                out.insert(key.clone(), child);
            }
            if at_target {
                match (edit.kind, edit.key) {
                    (PatchKind::ObjectAdd, Some(key)) => {
                        out.insert(key.to_string(), edit.value.clone());
                        hit = Hit::Applied;
                    }
                    _ => hit = Hit::Mismatch("object"),
                }
            }
            (Value::Object(out), hit)
        }
        Value::Array(items) => {
            let mut out: Vec<Value> = items
                .iter()
                .map(|item| walk(item, cursor.element(), edit).0)
                .collect();
            if !at_target {
                return (Value::Array(out), Hit::Missed);
            }
            let hit = match edit.kind {
                PatchKind::ArrayAdd => {
                    if !out.iter().any(|item| json_eq(item, edit.value)) {
                        out.push(edit.value.clone());
                    }
                    Hit::Applied
                }
                PatchKind::ArrayRemove => {
                    if let Some(pos) = out.iter().position(|item| json_eq(item, edit.value)) {
                        out.remove(pos);
                    }
                    Hit::Applied
                }
                PatchKind::ObjectAdd => Hit::Mismatch("array"),
            };
            (Value::Array(out), hit)
        }
        scalar => {
            let hit = if at_target {
                Hit::Mismatch(type_name(scalar))
            } else {
                Hit::Missed
            };
            (scalar.clone(), hit)
        }
    }
}

/// Apply one operation to `doc`, producing a new document.
pub fn apply_operation(index: usize, doc: &Value, op: &PatchOperation) -> Result<Value> {
    let (target, key) = match op.kind {
        PatchKind::ObjectAdd => match op.path.split_last() {
            Some((parent, key)) if !key.is_empty() => (parent, Some(key)),
            _ => {
                return Err(PatchError::Malformed {
                    index,
                    reason: "ObjectAdd path must end in a non-empty key".into(),
                })
            }
        },
        PatchKind::ArrayAdd | PatchKind::ArrayRemove => (op.path.clone(), None),
    };
    let edit = Edit {
        kind: op.kind,
        target: target.segments(),
        key,
        value: &op.value,
    };

    let (patched, hit) = walk(doc, Cursor::root(), &edit);
    match hit {
        Hit::Applied => {
            debug!(index, op = %op.kind, path = %op.path, "patch operation applied");
            Ok(patched)
        }
        Hit::Missed => Err(PatchError::TargetNotFound {
            index,
            path: target.to_string(),
        }),
        Hit::Mismatch(found) => Err(PatchError::TypeMismatch {
            index,
            path: target.to_string(),
            expected: op.kind.expected_target(),
            found,
        }),
    }
}

/// Apply `ops` left to right. Either every operation succeeds and the new
/// document is returned, or the first failure is returned and `doc` is
/// untouched.
pub fn apply_patch(doc: &Value, ops: &[PatchOperation]) -> Result<Value> {
    let mut current = doc.clone();
    for (index, op) in ops.iter().enumerate() {
        current = apply_operation(index, &current, op)?;
    }
    Ok(current)
}
