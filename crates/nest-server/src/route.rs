//! Mapping request URIs onto resource paths.

use nest_types::{ResourceKind, ResourcePath};

use crate::error::{ServerError, ServerResult};

/// Every resource lives under this prefix.
pub const API_PREFIX: &str = "/v1/";

/// A decoded `/v1/...` request path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestPath {
    pub path: ResourcePath,
    pub trailing_slash: bool,
}

impl RequestPath {
    /// Parse the raw (still percent-encoded) URI path. Segments are split
    /// before decoding, so an encoded `%2F` stays inside its segment.
    pub fn parse(raw: &str) -> ServerResult<Self> {
        let rest = raw.strip_prefix(API_PREFIX).ok_or_else(ServerError::bad_path)?;
        let (rest, trailing_slash) = match rest.strip_suffix('/') {
            Some(rest) => (rest, true),
            None => (rest, false),
        };
        if rest.is_empty() {
            return Err(ServerError::bad_path());
        }
        let segments = rest
            .split('/')
            .map(percent_decode)
            .collect::<ServerResult<Vec<_>>>()?;
        let path = ResourcePath::new(segments).map_err(|_| ServerError::bad_path())?;
        Ok(Self {
            path,
            trailing_slash,
        })
    }

    pub fn kind(&self) -> ResourceKind {
        self.path.kind()
    }

    /// Require the slash convention for this resource's kind: containers
    /// end in `/`, documents do not.
    pub fn require_canonical(&self) -> ServerResult<()> {
        self.require_slash(self.kind().is_container())
    }

    pub fn require_slash(&self, wanted: bool) -> ServerResult<()> {
        if self.trailing_slash == wanted {
            Ok(())
        } else {
            Err(ServerError::bad_path())
        }
    }
}

fn percent_decode(segment: &str) -> ServerResult<String> {
    let raw = segment.as_bytes();
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'%' {
            let hex_pair = raw.get(i + 1..i + 3).ok_or_else(ServerError::bad_path)?;
            let byte = hex::decode(hex_pair).map_err(|_| ServerError::bad_path())?;
            out.extend_from_slice(&byte);
            i += 3;
        } else {
            out.push(raw[i]);
            i += 1;
        }
    }
    String::from_utf8(out).map_err(|_| ServerError::bad_path())
}
