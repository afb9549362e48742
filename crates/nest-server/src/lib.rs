//! HTTP front end for NestDB.
//!
//! Serves the resource tree over `/v1/<db>/<doc>/<col>/<doc>...` with bearer
//! sessions issued at `/auth`, and streams change events to subscribers as
//! server-sent events.

pub mod auth;
pub mod config;
pub mod error;
pub mod handler;
pub mod route;
pub mod router;
pub mod server;
pub mod state;

pub use auth::{AuthProvider, Credentials, Identity, SessionStore};
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use route::RequestPath;
pub use server::NestServer;
pub use state::AppState;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use nest_tree::ResourceTree;
    use nest_types::ResourcePath;
    use serde_json::{json, Value};
    use tokio_stream::StreamExt;
    use tower::util::ServiceExt;

    struct Harness {
        app: Router,
        state: AppState,
        token: String,
    }

    impl Harness {
        fn new() -> Self {
            let state = AppState::new(ServerConfig::default(), ResourceTree::with_defaults());
            let token = state.sessions.login("alice").unwrap();
            Self {
                app: router::build_router(state.clone()),
                state,
                token,
            }
        }

        async fn send(&self, method: &str, uri: &str, body: &str) -> (StatusCode, Value) {
            send(&self.app, method, uri, Some(&self.token), body).await
        }
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: &str,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let response = app
            .clone()
            .oneshot(request.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn login_then_logout() {
        let h = Harness::new();
        let (status, body) = send(&h.app, "POST", "/auth", None, r#"{"username": "bob"}"#).await;
        assert_eq!(status, StatusCode::OK);
        let token = body["token"].as_str().unwrap().to_string();
        assert_eq!(token.len(), auth::TOKEN_LENGTH);

        let (status, _) = send(&h.app, "PUT", "/v1/db", Some(&token), "").await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _) = send(&h.app, "DELETE", "/auth", Some(&token), "").await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&h.app, "GET", "/v1/db/", Some(&token), "").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_without_username_is_400() {
        let h = Harness::new();
        let (status, body) = send(&h.app, "POST", "/auth", None, "{}").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!("No username in request body"));
    }

    #[tokio::test]
    async fn resources_require_a_token() {
        let h = Harness::new();
        let (status, _) = send(&h.app, "GET", "/v1/db/", None, "").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = send(&h.app, "GET", "/v1/db/", Some("forged"), "").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn options_skips_auth() {
        let h = Harness::new();
        let (status, _) = send(&h.app, "OPTIONS", "/v1/db/doc", None, "").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn database_create_is_create_only() {
        let h = Harness::new();
        let (status, body) = h.send("PUT", "/v1/db", "").await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, json!({"uri": "/v1/db"}));

        let (status, _) = h.send("PUT", "/v1/db", "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn document_create_replace_get() {
        let h = Harness::new();
        h.send("PUT", "/v1/db", "").await;

        let (status, body) = h.send("PUT", "/v1/db/doc", r#"{"a": 1}"#).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, json!({"uri": "/v1/db/doc"}));
        let (status, _) = h.send("PUT", "/v1/db/doc", r#"{"a": 2}"#).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = h.send("GET", "/v1/db/doc", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["path"], "/doc");
        assert_eq!(body["doc"], json!({"a": 2}));
        assert_eq!(body["meta"]["createdBy"], "alice");
    }

    #[tokio::test]
    async fn trailing_slash_rules() {
        let h = Harness::new();
        h.send("PUT", "/v1/db", "").await;
        h.send("PUT", "/v1/db/doc", "{}").await;

        let (status, body) = h.send("GET", "/v1/db", "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!("bad resource path"));
        let (status, _) = h.send("GET", "/v1/db/doc/", "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = h.send("PUT", "/v1/db/doc/col", "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = h.send("PUT", "/v1/db/doc/col/", "").await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn missing_resources_are_404() {
        let h = Harness::new();
        let (status, _) = h.send("GET", "/v1/nope/", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        h.send("PUT", "/v1/db", "").await;
        let (status, _) = h.send("GET", "/v1/db/ghost", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = h.send("DELETE", "/v1/db/ghost", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn database_listing_honours_interval() {
        let h = Harness::new();
        h.send("PUT", "/v1/db", "").await;
        for name in ["a", "b", "c", "d"] {
            h.send("PUT", &format!("/v1/db/{name}"), "{}").await;
        }

        let (_, body) = h.send("GET", "/v1/db/", "").await;
        assert_eq!(body.as_array().unwrap().len(), 4);

        let (status, body) = h.send("GET", "/v1/db/?interval=[b,c]", "").await;
        assert_eq!(status, StatusCode::OK);
        let paths: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|rep| rep["path"].as_str().unwrap())
            .collect();
        assert_eq!(paths, vec!["/b", "/c"]);
    }

    #[tokio::test]
    async fn post_generates_a_name() {
        let h = Harness::new();
        h.send("PUT", "/v1/db", "").await;
        let (status, body) = h.send("POST", "/v1/db/", r#"{"x": true}"#).await;
        assert_eq!(status, StatusCode::CREATED);

        let uri = body["uri"].as_str().unwrap();
        let name = uri.strip_prefix("/v1/db/").unwrap();
        assert_eq!(name.len(), 14);
        let (status, _) = h.send("GET", uri, "").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn invalid_json_body_is_400() {
        let h = Harness::new();
        h.send("PUT", "/v1/db", "").await;
        let (status, _) = h.send("PUT", "/v1/db/doc", "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn patch_reports_success_and_failure() {
        let h = Harness::new();
        h.send("PUT", "/v1/db", "").await;
        h.send("PUT", "/v1/db/doc", r#"{"tags": []}"#).await;

        let (status, body) = h
            .send(
                "PATCH",
                "/v1/db/doc",
                r#"[{"op": "ArrayAdd", "path": "/tags", "value": "x"}]"#,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["patchFailed"], false);
        assert_eq!(body["uri"], "/v1/db/doc");

        let (status, body) = h
            .send(
                "PATCH",
                "/v1/db/doc",
                r#"[{"op": "ArrayAdd", "path": "/missing", "value": 1}]"#,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["patchFailed"], true);

        let (status, body) = h.send("PATCH", "/v1/db/doc", r#"[{"op": "ArrayAdd"}]"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["patchFailed"], true);

        let (_, body) = h.send("GET", "/v1/db/doc", "").await;
        assert_eq!(body["doc"], json!({"tags": ["x"]}));

        let (status, _) = h.send("PATCH", "/v1/db/ghost", "[]").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn stale_timestamp_is_rejected() {
        let h = Harness::new();
        h.send("PUT", "/v1/db", "").await;
        h.send("PUT", "/v1/db/doc", "{}").await;
        let (status, _) = h.send("PUT", "/v1/db/doc?timestamp=1", "{}").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn deletes_answer_204() {
        let h = Harness::new();
        h.send("PUT", "/v1/db", "").await;
        h.send("PUT", "/v1/db/doc", "{}").await;
        h.send("PUT", "/v1/db/doc/col/", "").await;

        let (status, _) = h.send("DELETE", "/v1/db/doc/col/", "").await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = h.send("DELETE", "/v1/db/doc", "").await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = h.send("GET", "/v1/db/doc", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = h.send("DELETE", "/v1/db", "").await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn subscribe_streams_update_events() {
        let h = Harness::new();
        h.send("PUT", "/v1/db", "").await;
        h.send("PUT", "/v1/db/doc", r#"{"v": 0}"#).await;

        let request = Request::builder()
            .uri("/v1/db/doc?mode=subscribe")
            .header(header::AUTHORIZATION, format!("Bearer {}", h.token))
            .body(Body::empty())
            .unwrap();
        let response = h.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/event-stream"
        );

        let path = ResourcePath::parse("/db/doc").unwrap();
        h.state
            .tree
            .put_document(&path, json!({"v": 1}), "alice", None)
            .unwrap();

        let mut frames = response.into_body().into_data_stream();
        let mut seen = String::new();
        while !seen.contains("event: update") {
            let frame = tokio::time::timeout(Duration::from_secs(5), frames.next())
                .await
                .expect("no event within 5s")
                .expect("stream ended")
                .unwrap();
            seen.push_str(&String::from_utf8_lossy(&frame));
        }
        assert!(seen.contains("\"v\": 1"));
    }
}
