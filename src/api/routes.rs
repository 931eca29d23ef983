use axum::{extract::DefaultBodyLimit, middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use super::admin::admin_routes;
use super::auth::auth_routes;
use super::contact::contact_routes;
use super::exercises::exercise_routes;
use super::health::health_check;
use super::progress::progress_routes;
use super::users::user_routes;
use crate::auth::{cors_layer, csrf_middleware, security_header};
use crate::state::AppState;

const MAX_BODY_BYTES: usize = 1024 * 1024;

pub fn create_routes(state: AppState) -> Router {
    let api = Router::new()
        .merge(auth_routes(state.clone()))
        .merge(exercise_routes(state.clone()))
        .merge(progress_routes(state.clone()))
        .merge(user_routes(state.clone()))
        .merge(contact_routes(state.clone()))
        .merge(admin_routes(state.clone()))
        .layer(middleware::from_fn(csrf_middleware));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(security_header("x-content-type-options", "nosniff"))
        .layer(security_header("x-frame-options", "DENY"))
        .layer(security_header("referrer-policy", "same-origin"))
        .layer(cors_layer(&state.config.cors_origins))
        .layer(TraceLayer::new_for_http())
}
