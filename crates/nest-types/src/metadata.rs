//! Resource metadata and the canonical client-facing representation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::clock::now_millis;

/// Who created and last modified a resource, and when.
///
/// Timestamps are wall-clock milliseconds since the UNIX epoch. Successive
/// writes to one resource never move `last_modified_at` backwards, even if
/// the wall clock does: [`Metadata::modified`] clamps to the previous value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub created_at: i64,
    pub created_by: String,
    pub last_modified_at: i64,
    pub last_modified_by: String,
}

impl Metadata {
    /// Metadata for a resource created now by `identity`.
    pub fn created(identity: &str) -> Self {
        Self::created_at(identity, now_millis())
    }

    /// Metadata for a resource created at an explicit instant.
    pub fn created_at(identity: &str, at_ms: i64) -> Self {
        Self {
            created_at: at_ms,
            created_by: identity.to_string(),
            last_modified_at: at_ms,
            last_modified_by: identity.to_string(),
        }
    }

    /// Metadata for a replacement write by `identity` at `at_ms`.
    ///
    /// Creation fields are preserved; modification fields are refreshed.
    pub fn modified_at(&self, identity: &str, at_ms: i64) -> Self {
        Self {
            created_at: self.created_at,
            created_by: self.created_by.clone(),
            last_modified_at: at_ms.max(self.last_modified_at),
            last_modified_by: identity.to_string(),
        }
    }
}

/// Canonical rendering of a document: its path, body, and metadata.
///
/// This is what a GET returns and what update events carry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Representation {
    pub path: String,
    pub doc: Value,
    pub meta: Metadata,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn created_sets_both_timestamps_equal() {
        let meta = Metadata::created("alice");
        assert_eq!(meta.created_at, meta.last_modified_at);
        assert_eq!(meta.created_by, "alice");
        assert_eq!(meta.last_modified_by, "alice");
    }

    #[test]
    fn modified_preserves_creation_fields() {
        let original = Metadata::created_at("alice", 1_000);
        let updated = original.modified_at("bob", 2_000);
        assert_eq!(updated.created_at, 1_000);
        assert_eq!(updated.created_by, "alice");
        assert_eq!(updated.last_modified_at, 2_000);
        assert_eq!(updated.last_modified_by, "bob");
    }

    #[test]
    fn modified_never_moves_backwards() {
        let original = Metadata::created_at("alice", 5_000);
        let updated = original.modified_at("bob", 4_000);
        assert_eq!(updated.last_modified_at, 5_000);
    }

    #[test]
    fn metadata_serializes_camel_case() {
        let meta = Metadata::created_at("alice", 42);
        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(
            value,
            json!({
                "createdAt": 42,
                "createdBy": "alice",
                "lastModifiedAt": 42,
                "lastModifiedBy": "alice",
            })
        );
    }

    #[test]
    fn representation_shape() {
        let rep = Representation {
            path: "/db/doc".into(),
            doc: json!({"a": 1}),
            meta: Metadata::created_at("alice", 7),
        };
        let value = serde_json::to_value(&rep).unwrap();
        assert_eq!(value["path"], "/db/doc");
        assert_eq!(value["doc"]["a"], 1);
        assert_eq!(value["meta"]["createdAt"], 7);
    }
}
