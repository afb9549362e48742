use nest_notify::SubscriberSet;
use nest_skiplist::ConcurrentSkipList;
use nest_types::{Metadata, ResourcePath};

use crate::config::TreeEnv;
use crate::container::DocumentContainer;
use crate::document::Document;

/// A named set of documents inside a document.
pub struct Collection {
    path: ResourcePath,
    meta: Metadata,
    documents: ConcurrentSkipList<String, Document>,
    subscribers: SubscriberSet,
}

impl Collection {
    pub(crate) fn new(env: &TreeEnv, path: ResourcePath, meta: Metadata) -> Self {
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

impl DocumentContainer for Collection {
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
