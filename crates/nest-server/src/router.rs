use axum::routing::{get, post};
use axum::{middleware, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::state::AppState;

/// Build the axum router with every NestDB endpoint.
pub fn build_router(state: AppState) -> Router {
    let resources = Router::new()
        .route(
            "/v1/*rest",
            get(handler::get_resource)
                .put(handler::put_resource)
                .post(handler::post_resource)
                .patch(handler::patch_resource)
                .delete(handler::delete_resource)
                .options(handler::options),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            handler::require_auth,
        ));

    Router::new()
        .route(
            "/auth",
            post(handler::login)
                .delete(handler::logout)
                .options(handler::options),
        )
        .merge(resources)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
