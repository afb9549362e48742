use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use nest_tree::TreeConfig;

use crate::error::{ServerError, ServerResult};

pub const DEFAULT_PORT: u16 = 3318;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// JSON file of `{"user": "token"}` pairs loaded at startup.
    pub token_file: Option<PathBuf>,
    /// JSON Schema every stored document must satisfy.
    pub schema_file: Option<PathBuf>,
    pub token_ttl_secs: u64,
    pub preloaded_token_ttl_secs: u64,
    /// Interval between SSE keep-alive comments.
    pub keep_alive_secs: u64,
    pub tree: TreeConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            token_file: None,
            schema_file: None,
            token_ttl_secs: 60 * 60,
            preloaded_token_ttl_secs: 24 * 60 * 60,
            keep_alive_secs: 15,
            tree: TreeConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(raw: &str) -> ServerResult<Self> {
        toml::from_str(raw).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> ServerResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.bind_addr.set_port(port);
        self
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }

    pub fn preloaded_token_ttl(&self) -> Duration {
        Duration::from_secs(self.preloaded_token_ttl_secs)
    }

    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ServerConfig::default();
        assert_eq!(c.bind_addr.port(), 3318);
        assert_eq!(c.token_ttl(), Duration::from_secs(3600));
        assert_eq!(c.preloaded_token_ttl(), Duration::from_secs(86400));
        assert_eq!(c.keep_alive(), Duration::from_secs(15));
        assert!(c.token_file.is_none());
        assert!(c.schema_file.is_none());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = ServerConfig::from_toml_str(
            r#"
            bind_addr = "127.0.0.1:8080"
            keep_alive_secs = 5

            [tree]
            name_length = 20
            "#,
        )
        .unwrap();
        assert_eq!(c.bind_addr, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(c.keep_alive_secs, 5);
        assert_eq!(c.token_ttl_secs, 3600);
        assert_eq!(c.tree.name_length, 20);
        assert_eq!(c.tree.patch_retries, TreeConfig::default().patch_retries);
    }

    #[test]
    fn bad_toml_is_config_error() {
        let err = ServerConfig::from_toml_str("bind_addr = 7").unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nestdb.toml");
        std::fs::write(&path, "token_ttl_secs = 60\n").unwrap();
        let c = ServerConfig::load(&path).unwrap();
        assert_eq!(c.token_ttl(), Duration::from_secs(60));
    }

    #[test]
    fn port_override() {
        let c = ServerConfig::default().with_port(9000);
        assert_eq!(c.bind_addr.port(), 9000);
    }
}
