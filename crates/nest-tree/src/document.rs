use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use nest_notify::SubscriberSet;
use nest_skiplist::ConcurrentSkipList;
use nest_types::{Metadata, Representation, ResourcePath};

use crate::collection::Collection;
use crate::config::TreeEnv;
use crate::container::{DocumentContainer, WriteMode};
use crate::error::{Result, TreeError};

/// A JSON document, its metadata, and its child collections.
///
/// Stored documents are immutable snapshots: every write installs a new
/// `Document` in the parent's list. The collection list and the subscriber
/// set live behind `Arc`s so a replacement can share them with the snapshot
/// it supersedes.
pub struct Document {
    path: ResourcePath,
    body: Value,
    meta: Metadata,
    revision: u64,
    collections: Arc<ConcurrentSkipList<String, Collection>>,
    subscribers: Arc<SubscriberSet>,
}

impl Document {
    pub(crate) fn new(
        env: &TreeEnv,
        path: ResourcePath,
        body: Value,
        meta: Metadata,
        revision: u64,
    ) -> Self {
        Self {
            path,
            body,
            meta,
            revision,
            collections: Arc::new(env.new_list()),
            subscribers: Arc::new(SubscriberSet::new()),
        }
    }

    /// The snapshot that replaces `self`. Creation metadata and listeners
    /// carry over; collections carry over only for patches.
    pub(crate) fn replaced(
        &self,
        env: &TreeEnv,
        body: Value,
        identity: &str,
        now: i64,
        revision: u64,
        mode: WriteMode,
    ) -> Self {
        let collections = match mode {
            WriteMode::Patch => Arc::clone(&self.collections),
            WriteMode::Replace => Arc::new(env.new_list()),
        };
        Self {
            path: self.path.clone(),
            body,
            meta: self.meta.modified_at(identity, now),
            revision,
            collections,
            subscribers: Arc::clone(&self.subscribers),
        }
    }

    pub fn name(&self) -> &str {
        self.path.name()
    }

    pub fn path(&self) -> &ResourcePath {
        &self.path
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn meta(&self) -> &Metadata {
        &self.meta
    }

    /// Tree-wide unique id of this snapshot.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn representation(&self) -> Representation {
        Representation {
            path: self.path.within_database(),
            doc: self.body.clone(),
            meta: self.meta.clone(),
        }
    }

    pub fn subscribers(&self) -> &SubscriberSet {
        &self.subscribers
    }

    pub(crate) fn subscriber_handle(&self) -> Arc<SubscriberSet> {
        Arc::clone(&self.subscribers)
    }

    pub fn collections(&self) -> &ConcurrentSkipList<String, Collection> {
        &self.collections
    }

    pub fn get_collection(&self, name: &str) -> Option<Arc<Collection>> {
        self.collections.find(&name.to_string())
    }

    pub fn list_collections(&self) -> Vec<Arc<Collection>> {
        self.collections
            .query(None, None)
            .into_iter()
            .map(|(_, collection)| collection)
            .collect()
    }

    /// Create the collection `name`. Collections are create-only: an
    /// existing one is a `Conflict`, never replaced.
    pub fn put_collection(&self, env: &TreeEnv, name: &str, identity: &str) -> Result<ResourcePath> {
        let path = self.path.child(name)?;
        self.collections.upsert(name.to_string(), |_, existing| match existing {
            Some(_) => Err(TreeError::Conflict(path.to_string())),
            None => Ok(Collection::new(env, path.clone(), Metadata::created(identity))),
        })?;
        info!(path = %path, by = identity, "collection created");
        Ok(path)
    }

    /// Remove the collection `name`; its documents become unreachable.
    pub fn delete_collection(&self, env: &TreeEnv, name: &str) -> Result<Arc<Collection>> {
        let removed = self
            .collections
            .remove(&name.to_string())?
            .ok_or_else(|| TreeError::NotFound(format!("{}/{name}", self.path)))?;
        env.hub()
            .notify_delete(removed.subscribers(), &removed.path().within_database());
        removed.subscribers().close();
        info!(path = %removed.path(), "collection deleted");
        Ok(removed)
    }
}
