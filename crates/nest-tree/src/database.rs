use nest_notify::SubscriberSet;
use nest_skiplist::ConcurrentSkipList;
use nest_types::{Metadata, ResourcePath};

use crate::config::TreeEnv;
use crate::container::DocumentContainer;
use crate::document::Document;

/// A top-level database: a named set of documents.
///
/// Databases are create-only; see
/// [`ResourceTree::create_database`](crate::ResourceTree::create_database).
pub struct Database {
    path: ResourcePath,
    meta: Metadata,
    documents: ConcurrentSkipList<String, Document>,
    subscribers: SubscriberSet,
}

impl Database {
    pub fn new(env: &TreeEnv, path: ResourcePath, meta: Metadata) -> Self {
        Self {
            path,
            meta,
            documents: env.new_list(),
            subscribers: SubscriberSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.path.name()
    }

    pub fn meta(&self) -> &Metadata {
        &self.meta
    }
}

impl DocumentContainer for Database {
    fn path(&self) -> &ResourcePath {
        &self.path
    }

    fn documents(&self) -> &ConcurrentSkipList<String, Document> {
        &self.documents
    }

    fn subscribers(&self) -> &SubscriberSet {
        &self.subscribers
    }
}
