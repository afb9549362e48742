use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use nest_notify::SubscriptionHub;
use nest_skiplist::{ConcurrentSkipList, SkipListConfig};

use crate::schema::SchemaValidator;

/// Tunables for a [`ResourceTree`](crate::ResourceTree).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Length of names generated for POSTed documents.
    pub name_length: usize,
    /// How many times a patch re-reads and retries after losing a race.
    pub patch_retries: usize,
    /// Level count of every child list.
    pub max_level: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            name_length: 14,
            patch_retries: 8,
            max_level: SkipListConfig::default().max_level,
        }
    }
}

/// Everything tree operations share: config, validator, notification hub,
/// and the revision sequence.
pub struct TreeEnv {
    config: TreeConfig,
    validator: Arc<dyn SchemaValidator>,
    hub: SubscriptionHub,
    revisions: AtomicU64,
}

impl TreeEnv {
    pub fn new(config: TreeConfig, validator: Arc<dyn SchemaValidator>) -> Self {
        Self {
            config,
            validator,
            hub: SubscriptionHub::new(),
            revisions: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn validator(&self) -> &dyn SchemaValidator {
        self.validator.as_ref()
    }

    pub fn hub(&self) -> &SubscriptionHub {
        &self.hub
    }

    /// A tree-wide unique revision number for a freshly written document.
    pub(crate) fn next_revision(&self) -> u64 {
        self.revisions.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn new_list<V>(&self) -> ConcurrentSkipList<String, V> {
        ConcurrentSkipList::with_config(SkipListConfig::with_max_level(self.config.max_level))
    }
}
