use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use thiserror::Error;

use nest_tree::{SchemaError, TreeError};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// Malformed request: bad path shape, unparsable body or query.
    #[error("{0}")]
    BadRequest(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    pub fn bad_path() -> Self {
        Self::BadRequest("bad resource path".into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Tree(TreeError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Tree(TreeError::Internal(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Tree(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Schema(_) | Self::Config(_) | Self::Io(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    /// The body is the error message as a JSON string.
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %self, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "request rejected");
        }
        (status, Json(self.to_string())).into_response()
    }
}
