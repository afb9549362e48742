use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use tracing::{debug, info};

use nest_types::random_name;

use crate::error::{ServerError, ServerResult};

/// Length of issued bearer tokens.
pub const TOKEN_LENGTH: usize = 14;

/// The principal a request acts as. Its name is what metadata records.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
}

impl Identity {
    pub fn user(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credentials {
    Bearer(String),
    Anonymous,
}

impl Credentials {
    /// Read `Authorization: Bearer <token>`. Anything else is anonymous.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| token.trim())
            .filter(|token| !token.is_empty())
            .map(|token| Self::Bearer(token.to_string()))
            .unwrap_or(Self::Anonymous)
    }
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Identity>;
}

struct Session {
    user: String,
    expires: Instant,
}

/// Live bearer sessions, keyed by token.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
    ttl: Duration,
}

impl SessionStore {
    /// A store whose `login` tokens live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    fn lock(&self) -> ServerResult<MutexGuard<'_, HashMap<String, Session>>> {
        self.sessions
            .lock()
            .map_err(|_| ServerError::Internal("session store lock poisoned".into()))
    }

    /// Open a session for `user` and return its fresh token.
    pub fn login(&self, user: &str) -> ServerResult<String> {
        if user.is_empty() {
            return Err(ServerError::BadRequest("No username in request body".into()));
        }
        let token = random_name(TOKEN_LENGTH);
        self.insert(user, &token, self.ttl)?;
        info!(user, "session opened");
        Ok(token)
    }

    pub fn insert(&self, user: &str, token: &str, ttl: Duration) -> ServerResult<()> {
        self.lock()?.insert(
            token.to_string(),
            Session {
                user: user.to_string(),
                expires: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    /// End the session behind `token`. Unknown and expired tokens are
    /// `Unauthorized`; an expired one is dropped either way.
    pub fn logout(&self, token: &str) -> ServerResult<()> {
        let session = self
            .lock()?
            .remove(token)
            .ok_or_else(|| ServerError::Unauthorized("unknown token".into()))?;
        if session.expires <= Instant::now() {
            return Err(ServerError::Unauthorized("token is expired".into()));
        }
        info!(user = %session.user, "session closed");
        Ok(())
    }

    pub fn lookup(&self, token: &str) -> ServerResult<Identity> {
        let mut sessions = self.lock()?;
        let session = sessions
            .get(token)
            .ok_or_else(|| ServerError::Unauthorized("unknown token".into()))?;
        if session.expires <= Instant::now() {
            sessions.remove(token);
            return Err(ServerError::Unauthorized("token is expired".into()));
        }
        Ok(Identity::user(session.user.clone()))
    }

    /// Load `{"user": "token", ...}` from `path`; each token lives for `ttl`.
    pub fn load_token_file(&self, path: &Path, ttl: Duration) -> ServerResult<usize> {
        let raw = std::fs::read(path)?;
        let tokens: HashMap<String, String> = serde_json::from_slice(&raw)
            .map_err(|e| ServerError::Config(format!("token file {}: {e}", path.display())))?;
        for (user, token) in &tokens {
            self.insert(user, token, ttl)?;
        }
        info!(path = %path.display(), count = tokens.len(), "tokens preloaded");
        Ok(tokens.len())
    }

    /// Drop every expired session; returns how many went.
    pub fn purge_expired(&self) -> ServerResult<usize> {
        let now = Instant::now();
        let mut sessions = self.lock()?;
        let before = sessions.len();
        sessions.retain(|_, session| session.expires > now);
        let purged = before - sessions.len();
        if purged > 0 {
            debug!(purged, "expired sessions dropped");
        }
        Ok(purged)
    }

    pub fn len(&self) -> usize {
        self.lock().map(|sessions| sessions.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AuthProvider for SessionStore {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Identity> {
        match credentials {
            Credentials::Bearer(token) => self.lookup(token),
            Credentials::Anonymous => Err(ServerError::Unauthorized("missing bearer token".into())),
        }
    }
}
