use std::sync::Arc;

use nest_tree::{AllowAll, JsonSchema, ResourceTree, SchemaValidator};

use crate::auth::SessionStore;
use crate::config::ServerConfig;
use crate::error::ServerResult;

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub tree: Arc<ResourceTree>,
    pub sessions: Arc<SessionStore>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig, tree: ResourceTree) -> Self {
        let sessions = SessionStore::new(config.token_ttl());
        Self {
            tree: Arc::new(tree),
            sessions: Arc::new(sessions),
            config: Arc::new(config),
        }
    }

    /// Build the tree and session store `config` describes, reading the
    /// schema and token files it names.
    pub fn from_config(config: ServerConfig) -> ServerResult<Self> {
        let validator: Arc<dyn SchemaValidator> = match &config.schema_file {
            Some(path) => {
                tracing::info!(path = %path.display(), "loading document schema");
                Arc::new(JsonSchema::from_file(path)?)
            }
            None => Arc::new(AllowAll),
        };
        let tree = ResourceTree::new(config.tree.clone(), validator);
        let state = Self::new(config, tree);
        if let Some(path) = &state.config.token_file {
            state
                .sessions
                .load_token_file(path, state.config.preloaded_token_ttl())?;
        }
        Ok(state)
    }
}
