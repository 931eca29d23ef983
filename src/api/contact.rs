use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::post,
    Router,
};

use super::extract::Json;
use crate::auth::{
    optional_session_middleware, rate_limit_middleware, MessageResponse, UserSession,
};
use crate::error::AppError;
use crate::models::ContactRequest;
use crate::state::AppState;

pub fn contact_routes(state: AppState) -> Router {
    Router::new()
        .route("/contact", post(submit_contact))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            optional_session_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
}

/// Contact form; linked to the account when sent while logged in
#[tracing::instrument(skip(state, session, request))]
async fn submit_contact(
    State(state): State<AppState>,
    session: Option<UserSession>,
    Json(request): Json<ContactRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    state
        .contact_service
        .submit(request, session.map(|session| session.user_id))
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new(
            "Vielen Dank für Ihre Nachricht. Wir melden uns bald bei Ihnen.",
        )),
    ))
}
