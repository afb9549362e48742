use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, Request, State};
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::middleware::Next;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Json, Response};
use axum::Extension;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;
use tracing::{info, warn};

use nest_notify::{ChannelListener, EventListener, ResourceEvent};
use nest_patch::parse_patch;
use nest_tree::{PutOutcome, TreeError};
use nest_types::{ResourceKind, ResourcePath};

use crate::auth::{AuthProvider, Credentials, Identity};
use crate::error::{ServerError, ServerResult};
use crate::route::RequestPath;
use crate::state::AppState;

pub const ALLOWED_METHODS: &str = "GET, PUT, POST, PATCH, DELETE, OPTIONS";

#[derive(Debug, Default, Deserialize)]
pub struct ResourceQuery {
    pub mode: Option<String>,
    pub interval: Option<String>,
    pub timestamp: Option<String>,
}

impl ResourceQuery {
    fn subscribe(&self) -> bool {
        self.mode.as_deref() == Some("subscribe")
    }

    /// `[start,end]`, either bound possibly empty.
    fn interval(&self) -> ServerResult<(Option<String>, Option<String>)> {
        let Some(raw) = self.interval.as_deref().filter(|raw| !raw.is_empty()) else {
            return Ok((None, None));
        };
        let inner = raw.trim_start_matches('[').trim_end_matches(']');
        let (start, end) = inner
            .split_once(',')
            .ok_or_else(|| ServerError::BadRequest("unable to parse interval request".into()))?;
        let bound = |s: &str| Some(s.trim().to_string()).filter(|s| !s.is_empty());
        Ok((bound(start), bound(end)))
    }

    fn timestamp(&self) -> ServerResult<Option<i64>> {
        self.timestamp
            .as_deref()
            .map(|raw| {
                raw.parse::<i64>()
                    .map_err(|_| ServerError::BadRequest(format!("bad timestamp {raw:?}")))
            })
            .transpose()
    }
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    #[serde(default)]
    username: String,
}

fn parse_json(body: &[u8]) -> ServerResult<Value> {
    serde_json::from_slice(body).map_err(|e| ServerError::BadRequest(format!("invalid JSON body: {e}")))
}

fn created(uri: &str) -> Response {
    (StatusCode::CREATED, Json(json!({ "uri": uri }))).into_response()
}

// ---- Sessions ----

/// `POST /auth {"username": ...}` ⇒ `{"token": ...}`.
pub async fn login(State(state): State<AppState>, body: Bytes) -> ServerResult<Json<Value>> {
    let request: LoginRequest = serde_json::from_slice(&body)
        .map_err(|_| ServerError::BadRequest("No username in request body".into()))?;
    let token = state.sessions.login(&request.username)?;
    Ok(Json(json!({ "token": token })))
}

/// `DELETE /auth` with the bearer token to revoke.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ServerResult<StatusCode> {
    match Credentials::from_headers(&headers) {
        Credentials::Bearer(token) => {
            state.sessions.logout(&token)?;
            Ok(StatusCode::NO_CONTENT)
        }
        Credentials::Anonymous => Err(ServerError::Unauthorized("missing bearer token".into())),
    }
}

/// Resolve the bearer token into an [`Identity`] request extension.
/// `OPTIONS` passes through unauthenticated.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ServerResult<Response> {
    if request.method() != Method::OPTIONS {
        let credentials = Credentials::from_headers(request.headers());
        let identity = state.sessions.authenticate(&credentials).await?;
        request.extensions_mut().insert(identity);
    }
    Ok(next.run(request).await)
}

pub async fn options() -> impl IntoResponse {
    (StatusCode::OK, [(header::ALLOW, ALLOWED_METHODS)])
}

// ---- Resources ----

pub async fn get_resource(
    State(state): State<AppState>,
    uri: Uri,
    Query(query): Query<ResourceQuery>,
) -> ServerResult<Response> {
    let target = RequestPath::parse(uri.path())?;
    target.require_canonical()?;
    if query.subscribe() {
        return subscribe(&state, &target.path);
    }
    match target.kind() {
        ResourceKind::Document => Ok(Json(state.tree.get_document(&target.path)?).into_response()),
        ResourceKind::Database | ResourceKind::Collection => {
            let (start, end) = query.interval()?;
            let listed = state
                .tree
                .list_documents(&target.path, start.as_deref(), end.as_deref())?;
            Ok(Json(listed).into_response())
        }
    }
}

/// Attach an event stream to the resource at `path`.
fn subscribe(state: &AppState, path: &ResourcePath) -> ServerResult<Response> {
    let (listener, events) = ChannelListener::channel();
    let registration: Arc<dyn EventListener> = listener;
    state.tree.subscribe(path, &registration)?;
    info!(path = %path, "subscriber attached");

    // The tree only holds a weak handle; the stream owns the strong one,
    // so the registration lapses when the client goes away.
    let stream = UnboundedReceiverStream::new(events).map(move |event| {
        let _registration = &registration;
        Ok::<_, Infallible>(sse_event(&event))
    });
    let keep_alive = KeepAlive::new().interval(state.config.keep_alive());
    Ok(Sse::new(stream).keep_alive(keep_alive).into_response())
}

fn sse_event(event: &ResourceEvent) -> Event {
    match event.data() {
        // Carriage returns cannot appear in an SSE data field.
        Ok(data) => Event::default()
            .event(event.kind.to_string())
            .id(event.id.to_string())
            .data(data.replace('\r', "")),
        Err(e) => {
            warn!(id = event.id, error = %e, "event could not be rendered");
            Event::default().comment("event dropped")
        }
    }
}

pub async fn put_resource(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    uri: Uri,
    Query(query): Query<ResourceQuery>,
    body: Bytes,
) -> ServerResult<Response> {
    let target = RequestPath::parse(uri.path())?;
    match target.kind() {
        ResourceKind::Database => {
            target.require_slash(false)?;
            state.tree.create_database(target.path.name(), &identity.name)?;
            Ok(created(uri.path()))
        }
        ResourceKind::Document => {
            target.require_slash(false)?;
            let body = parse_json(&body)?;
            let result =
                state
                    .tree
                    .put_document(&target.path, body, &identity.name, query.timestamp()?)?;
            let status = match result.outcome {
                PutOutcome::Created => StatusCode::CREATED,
                PutOutcome::Replaced => StatusCode::OK,
            };
            Ok((status, Json(json!({ "uri": uri.path() }))).into_response())
        }
        ResourceKind::Collection => {
            target.require_slash(true)?;
            state.tree.put_collection(&target.path, &identity.name)?;
            Ok(created(uri.path()))
        }
    }
}

/// Create a document under a generated name.
pub async fn post_resource(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    uri: Uri,
    body: Bytes,
) -> ServerResult<Response> {
    let target = RequestPath::parse(uri.path())?;
    if !target.kind().is_container() {
        return Err(ServerError::bad_path());
    }
    target.require_slash(true)?;
    let body = parse_json(&body)?;
    let result = state.tree.post_document(&target.path, body, &identity.name)?;
    Ok(created(&format!("{}{}", uri.path(), result.path.name())))
}

/// Structural and schema failures still answer 200, flagged
/// `patchFailed`; the stored document is untouched.
pub async fn patch_resource(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    uri: Uri,
    body: Bytes,
) -> ServerResult<Response> {
    let target = RequestPath::parse(uri.path())?;
    if target.kind() != ResourceKind::Document {
        return Err(ServerError::bad_path());
    }
    target.require_slash(false)?;
    let raw = parse_json(&body)?;

    let outcome = parse_patch(&raw)
        .map_err(TreeError::from)
        .and_then(|ops| state.tree.patch_document(&target.path, &ops, &identity.name));
    let (failed, message) = match outcome {
        Ok(_) => (false, "patch applied".to_string()),
        Err(e) if e.is_patch_failure() => {
            warn!(path = %target.path, error = %e, "patch rejected");
            (true, e.to_string())
        }
        Err(e) => return Err(e.into()),
    };
    Ok(Json(json!({
        "uri": uri.path(),
        "patchFailed": failed,
        "message": message,
    }))
    .into_response())
}

pub async fn delete_resource(State(state): State<AppState>, uri: Uri) -> ServerResult<StatusCode> {
    let target = RequestPath::parse(uri.path())?;
    match target.kind() {
        ResourceKind::Database => {
            target.require_slash(false)?;
            state.tree.delete_database(target.path.name())?;
        }
        ResourceKind::Document => {
            target.require_slash(false)?;
            state.tree.delete_document(&target.path)?;
        }
        ResourceKind::Collection => {
            target.require_slash(true)?;
            state.tree.delete_collection(&target.path)?;
        }
    }
    Ok(StatusCode::NO_CONTENT)
}
