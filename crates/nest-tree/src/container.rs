use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use nest_notify::SubscriberSet;
use nest_patch::{apply_patch, PatchOperation};
use nest_skiplist::ConcurrentSkipList;
use nest_types::{now_millis, random_name, Metadata, Representation, ResourcePath};

use crate::config::TreeEnv;
use crate::document::Document;
use crate::error::{Result, TreeError};

/// Whether a put created its target or replaced an existing one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PutOutcome {
    Created,
    Replaced,
}

/// Outcome of a successful document write.
#[derive(Clone, Debug, PartialEq)]
pub struct PutResult {
    pub outcome: PutOutcome,
    pub path: ResourcePath,
    pub representation: Representation,
}

/// How a write treats the document it replaces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteMode {
    /// Overwrite: the document starts over with no collections. Creates the
    /// document if absent.
    Replace,
    /// Patch: body and modification metadata change, collections are kept.
    /// Fails with `NotFound` if the document is absent.
    Patch,
}

/// Optimistic-concurrency guard checked against the stored document, under
/// its node lock, immediately before a replacement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Precondition {
    /// Client-supplied: the stored `lastModifiedAt` must equal this.
    LastModifiedAt(i64),
    /// The stored document must be exactly the revision read earlier.
    Unchanged { revision: u64 },
}

impl Precondition {
    fn check(&self, stored: &Document) -> Result<()> {
        match *self {
            Self::LastModifiedAt(expected) if expected != stored.meta().last_modified_at => {
                Err(TreeError::PreconditionFailed {
                    expected,
                    actual: stored.meta().last_modified_at,
                })
            }
            Self::Unchanged { revision } if revision != stored.revision() => {
                Err(TreeError::RevisionChanged {
                    expected: revision,
                    actual: stored.revision(),
                })
            }
            _ => Ok(()),
        }
    }
}

/// A resource whose children are documents: a database or a collection.
pub trait DocumentContainer: Send + Sync {
    fn path(&self) -> &ResourcePath;
    fn documents(&self) -> &ConcurrentSkipList<String, Document>;
    fn subscribers(&self) -> &SubscriberSet;

    fn child_path(&self, name: &str) -> Result<ResourcePath> {
        Ok(self.path().child(name)?)
    }

    fn get_child(&self, name: &str) -> Option<Arc<Document>> {
        self.documents().find(&name.to_string())
    }

    /// Children with `start <= name <= end`, in name order. `None` bounds
    /// are open.
    fn list_children(&self, start: Option<&str>, end: Option<&str>) -> Vec<Arc<Document>> {
        let start = start.map(str::to_string);
        let end = end.map(str::to_string);
        self.documents()
            .query(start.as_ref(), end.as_ref())
            .into_iter()
            .map(|(_, document)| document)
            .collect()
    }

    /// Validate `body` and create or replace the child `name`.
    fn put_child(
        &self,
        env: &TreeEnv,
        name: &str,
        body: Value,
        identity: &str,
        precondition: Option<Precondition>,
    ) -> Result<PutResult> {
        if let Err(e) = env.validator().validate(&body) {
            warn!(path = %self.path(), child = name, error = %e, "document rejected by schema");
            return Err(e.into());
        }
        self.write_child(env, name, body, identity, precondition, WriteMode::Replace)
    }

    /// Create a child under a freshly generated name.
    fn post_child(&self, env: &TreeEnv, body: Value, identity: &str) -> Result<PutResult> {
        let name = random_name(env.config().name_length);
        self.put_child(env, &name, body, identity, None)
    }

    /// Store an already validated body. The create/replace decision, the
    /// precondition check, and metadata carry-over all happen inside one
    /// upsert, so they see the same stored document.
    fn write_child(
        &self,
        env: &TreeEnv,
        name: &str,
        body: Value,
        identity: &str,
        precondition: Option<Precondition>,
        mode: WriteMode,
    ) -> Result<PutResult> {
        let path = self.child_path(name)?;
        let now = now_millis();
        let revision = env.next_revision();
        let mut written = None;

        let outcome = self.documents().upsert(name.to_string(), |_, stored| {
            let document = match stored {
                Some(stored) => {
                    if let Some(precondition) = precondition {
                        precondition.check(stored)?;
                    }
                    stored.replaced(env, body, identity, now, revision, mode)
                }
                None if mode == WriteMode::Patch => {
                    return Err(TreeError::NotFound(path.to_string()));
                }
                None => Document::new(
                    env,
                    path.clone(),
                    body,
                    Metadata::created_at(identity, now),
                    revision,
                ),
            };
            written = Some((document.representation(), document.subscriber_handle()));
            Ok(document)
        })?;

        let Some((representation, subscribers)) = written else {
            return Err(TreeError::Internal(format!("write to {path} produced no document")));
        };
        let outcome = if outcome.is_created() {
            info!(path = %path, by = identity, "document created");
            PutOutcome::Created
        } else {
            debug!(path = %path, by = identity, ?mode, "document replaced");
            PutOutcome::Replaced
        };

        env.hub().notify_update(&subscribers, &representation);
        env.hub().notify_update(self.subscribers(), &representation);
        Ok(PutResult {
            outcome,
            path,
            representation,
        })
    }

    /// Apply `ops` to the child `name`.
    ///
    /// The patch runs against a snapshot without holding any lock; the
    /// result is written back only if the document is still that snapshot.
    /// Lost races re-read and retry up to `patch_retries` times.
    fn patch_child(
        &self,
        env: &TreeEnv,
        name: &str,
        ops: &[PatchOperation],
        identity: &str,
    ) -> Result<Representation> {
        let mut attempt = 0;
        loop {
            let current = self
                .get_child(name)
                .ok_or_else(|| TreeError::NotFound(format!("{}/{name}", self.path())))?;
            let patched = apply_patch(current.body(), ops)?;
            if let Err(e) = env.validator().validate(&patched) {
                warn!(path = %current.path(), error = %e, "patched document rejected by schema");
                return Err(e.into());
            }
            let guard = Precondition::Unchanged {
                revision: current.revision(),
            };
            match self.write_child(env, name, patched, identity, Some(guard), WriteMode::Patch) {
                Ok(result) => return Ok(result.representation),
                Err(TreeError::RevisionChanged { .. }) if attempt < env.config().patch_retries => {
                    attempt += 1;
                    debug!(path = %current.path(), attempt, "patch lost a race, retrying");
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Remove the child `name`, notify its listeners and the container's,
    /// then drop its listener set. Descendants become unreachable.
    fn delete_child(&self, env: &TreeEnv, name: &str) -> Result<Arc<Document>> {
        let removed = self
            .documents()
            .remove(&name.to_string())?
            .ok_or_else(|| TreeError::NotFound(format!("{}/{name}", self.path())))?;

        let path = removed.path().within_database();
        env.hub().notify_delete(removed.subscribers(), &path);
        env.hub().notify_delete(self.subscribers(), &path);
        removed.subscribers().close();
        info!(path = %removed.path(), "document deleted");
        Ok(removed)
    }
}
