use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use nest_notify::{EventListener, NotifyError};
use nest_patch::PatchOperation;
use nest_skiplist::ConcurrentSkipList;
use nest_types::{Metadata, Representation, ResourceKind, ResourcePath};

use crate::collection::Collection;
use crate::config::{TreeConfig, TreeEnv};
use crate::container::{DocumentContainer, Precondition, PutResult};
use crate::database::Database;
use crate::document::Document;
use crate::error::{Result, TreeError};
use crate::schema::{AllowAll, SchemaValidator};

/// A resource that holds documents.
#[derive(Clone)]
pub enum Container {
    Database(Arc<Database>),
    Collection(Arc<Collection>),
}

impl Container {
    pub fn as_dyn(&self) -> &dyn DocumentContainer {
        match self {
            Self::Database(db) => db.as_ref(),
            Self::Collection(col) => col.as_ref(),
        }
    }
}

/// Any node of the tree, as found by [`ResourceTree::resolve`].
#[derive(Clone)]
pub enum Resource {
    Database(Arc<Database>),
    Document(Arc<Document>),
    Collection(Arc<Collection>),
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Database(_) => ResourceKind::Database,
            Self::Document(_) => ResourceKind::Document,
            Self::Collection(_) => ResourceKind::Collection,
        }
    }

    fn subscribers(&self) -> &nest_notify::SubscriberSet {
        match self {
            Self::Database(db) => db.subscribers(),
            Self::Document(doc) => doc.subscribers(),
            Self::Collection(col) => col.subscribers(),
        }
    }
}

impl From<Container> for Resource {
    fn from(container: Container) -> Self {
        match container {
            Container::Database(db) => Self::Database(db),
            Container::Collection(col) => Self::Collection(col),
        }
    }
}

/// The root of the hierarchy: every database, plus path-based access to
/// everything below them.
///
/// Paths are decoded [`ResourcePath`]s; each level is one skip-list lookup.
pub struct ResourceTree {
    env: TreeEnv,
    databases: ConcurrentSkipList<String, Database>,
}

impl ResourceTree {
    pub fn new(config: TreeConfig, validator: Arc<dyn SchemaValidator>) -> Self {
        let env = TreeEnv::new(config, validator);
        let databases = env.new_list();
        Self { env, databases }
    }

    /// A tree with default config that accepts every body.
    pub fn with_defaults() -> Self {
        Self::new(TreeConfig::default(), Arc::new(AllowAll))
    }

    pub fn env(&self) -> &TreeEnv {
        &self.env
    }

    // ---- Databases ----

    /// Create the database `name`. An existing database is a `Conflict`;
    /// databases are never replaced.
    pub fn create_database(&self, name: &str, identity: &str) -> Result<ResourcePath> {
        let path = ResourcePath::database(name)?;
        self.databases.upsert(name.to_string(), |_, existing| match existing {
            Some(_) => Err(TreeError::Conflict(path.to_string())),
            None => Ok(Database::new(&self.env, path.clone(), Metadata::created(identity))),
        })?;
        info!(path = %path, by = identity, "database created");
        Ok(path)
    }

    pub fn get_database(&self, name: &str) -> Result<Arc<Database>> {
        self.databases
            .find(&name.to_string())
            .ok_or_else(|| TreeError::NotFound(format!("/{name}")))
    }

    pub fn list_databases(&self) -> Vec<Arc<Database>> {
        self.databases
            .query(None, None)
            .into_iter()
            .map(|(_, db)| db)
            .collect()
    }

    /// Delete the database `name`. Its documents become unreachable.
    pub fn delete_database(&self, name: &str) -> Result<Arc<Database>> {
        let removed = self
            .databases
            .remove(&name.to_string())?
            .ok_or_else(|| TreeError::NotFound(format!("/{name}")))?;
        self.env.hub().notify_delete(removed.subscribers(), "/");
        removed.subscribers().close();
        info!(path = %removed.path(), "database deleted");
        Ok(removed)
    }

    // ---- Resolution ----

    /// Walk `path` down the hierarchy, one lookup per segment.
    ///
    /// `NotFound` names the shortest prefix of `path` that does not exist.
    pub fn resolve(&self, path: &ResourcePath) -> Result<Resource> {
        let segments = path.segments();
        let mut container = Container::Database(self.get_database(path.database_name())?);
        let mut depth = 1;
        loop {
            if depth == segments.len() {
                return Ok(container.into());
            }
            let document = container
                .as_dyn()
                .get_child(&segments[depth])
                .ok_or_else(|| not_found(path, depth))?;
            depth += 1;
            if depth == segments.len() {
                return Ok(Resource::Document(document));
            }
            let collection = document
                .get_collection(&segments[depth])
                .ok_or_else(|| not_found(path, depth))?;
            container = Container::Collection(collection);
            depth += 1;
        }
    }

    /// Resolve a path that must address a database or collection.
    pub fn container(&self, path: &ResourcePath) -> Result<Container> {
        match self.resolve(path)? {
            Resource::Database(db) => Ok(Container::Database(db)),
            Resource::Collection(col) => Ok(Container::Collection(col)),
            Resource::Document(_) => Err(wrong_kind(path, "a database or collection")),
        }
    }

    /// Resolve a path that must address a document.
    pub fn document(&self, path: &ResourcePath) -> Result<Arc<Document>> {
        match self.resolve(path)? {
            Resource::Document(doc) => Ok(doc),
            _ => Err(wrong_kind(path, "a document")),
        }
    }

    /// Resolve a path that must address a collection.
    pub fn collection(&self, path: &ResourcePath) -> Result<Arc<Collection>> {
        match self.resolve(path)? {
            Resource::Collection(col) => Ok(col),
            _ => Err(wrong_kind(path, "a collection")),
        }
    }

    fn parent_container(&self, path: &ResourcePath) -> Result<Container> {
        if path.kind() != ResourceKind::Document {
            return Err(wrong_kind(path, "a document"));
        }
        let parent = path
            .parent()
            .ok_or_else(|| wrong_kind(path, "a document"))?;
        self.container(&parent)
    }

    fn parent_document(&self, path: &ResourcePath) -> Result<Arc<Document>> {
        if path.kind() != ResourceKind::Collection {
            return Err(wrong_kind(path, "a collection"));
        }
        let parent = path
            .parent()
            .ok_or_else(|| wrong_kind(path, "a collection"))?;
        self.document(&parent)
    }

    // ---- Documents ----

    pub fn get_document(&self, path: &ResourcePath) -> Result<Representation> {
        Ok(self.document(path)?.representation())
    }

    /// Create or replace the document at `path`. With `timestamp`, an
    /// existing document is replaced only if its `lastModifiedAt` matches.
    pub fn put_document(
        &self,
        path: &ResourcePath,
        body: Value,
        identity: &str,
        timestamp: Option<i64>,
    ) -> Result<PutResult> {
        let parent = self.parent_container(path)?;
        parent.as_dyn().put_child(
            &self.env,
            path.name(),
            body,
            identity,
            timestamp.map(Precondition::LastModifiedAt),
        )
    }

    /// Create a document under a generated name in the container at `path`.
    pub fn post_document(&self, path: &ResourcePath, body: Value, identity: &str) -> Result<PutResult> {
        self.container(path)?.as_dyn().post_child(&self.env, body, identity)
    }

    pub fn patch_document(
        &self,
        path: &ResourcePath,
        ops: &[PatchOperation],
        identity: &str,
    ) -> Result<Representation> {
        let parent = self.parent_container(path)?;
        parent.as_dyn().patch_child(&self.env, path.name(), ops, identity)
    }

    pub fn delete_document(&self, path: &ResourcePath) -> Result<()> {
        let parent = self.parent_container(path)?;
        parent.as_dyn().delete_child(&self.env, path.name())?;
        Ok(())
    }

    /// Representations of the documents in the container at `path` whose
    /// names fall in `[start, end]`.
    pub fn list_documents(
        &self,
        path: &ResourcePath,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Vec<Representation>> {
        let container = self.container(path)?;
        Ok(container
            .as_dyn()
            .list_children(start, end)
            .iter()
            .map(|doc| doc.representation())
            .collect())
    }

    // ---- Collections ----

    pub fn put_collection(&self, path: &ResourcePath, identity: &str) -> Result<ResourcePath> {
        let parent = self.parent_document(path)?;
        parent.put_collection(&self.env, path.name(), identity)
    }

    pub fn delete_collection(&self, path: &ResourcePath) -> Result<()> {
        let parent = self.parent_document(path)?;
        parent.delete_collection(&self.env, path.name())?;
        Ok(())
    }

    // ---- Subscriptions ----

    /// Register `listener` for changes to the resource at `path`. Returns
    /// `false` if it was already registered there.
    ///
    /// A resource deleted between the lookup and the registration has a
    /// closed subscriber set; that is reported as `NotFound`.
    pub fn subscribe(&self, path: &ResourcePath, listener: &Arc<dyn EventListener>) -> Result<bool> {
        let resource = self.resolve(path)?;
        match self.env.hub().subscribe(resource.subscribers(), listener) {
            Err(NotifyError::Closed) => Err(TreeError::NotFound(path.to_string())),
            other => Ok(other?),
        }
    }
}

fn not_found(path: &ResourcePath, depth: usize) -> TreeError {
    let prefix: String = path.segments()[..=depth]
        .iter()
        .map(|segment| format!("/{segment}"))
        .collect();
    TreeError::NotFound(prefix)
}

fn wrong_kind(path: &ResourcePath, expected: &str) -> TreeError {
    TreeError::InvalidPath(format!("{path} is a {}, expected {expected}", path.kind()))
}
