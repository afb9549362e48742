use std::fmt;

use serde::Serialize;

use nest_types::Representation;

use crate::error::{NotifyError, Result};

/// What happened to the resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Update,
    Delete,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// A change notification.
///
/// Update events carry the fresh representation; delete events carry only
/// the path of the removed resource.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResourceEvent {
    /// Strictly increasing per hub; nanoseconds since the epoch when the
    /// clock allows it.
    pub id: u64,
    pub kind: EventKind,
    pub path: String,
    pub representation: Option<Representation>,
}

impl ResourceEvent {
    pub fn update(id: u64, representation: Representation) -> Self {
        Self {
            id,
            kind: EventKind::Update,
            path: representation.path.clone(),
            representation: Some(representation),
        }
    }

    pub fn delete(id: u64, path: impl Into<String>) -> Self {
        Self {
            id,
            kind: EventKind::Delete,
            path: path.into(),
            representation: None,
        }
    }

    /// Payload as sent to clients: the pretty-printed representation for
    /// updates, the bare path for deletes.
    pub fn data(&self) -> Result<String> {
        match (&self.kind, &self.representation) {
            (EventKind::Update, Some(rep)) => serde_json::to_string_pretty(rep)
                .map_err(|e| NotifyError::Serialization(e.to_string())),
            _ => Ok(self.path.clone()),
        }
    }
}
