use axum::{
    extract::State,
    middleware,
    routing::{get, put},
    Router,
};
use axum_extra::extract::cookie::CookieJar;

use super::extract::Json;
use crate::auth::{
    session_auth_middleware, session_cookie_removal, ChangePasswordRequest, MessageResponse,
    UserSession,
};
use crate::error::AppError;
use crate::models::{AchievementView, UpdateProfileRequest, UserResponse, UserStats};
use crate::state::AppState;

pub fn user_routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/users/me",
            get(get_profile).put(update_profile).delete(delete_account),
        )
        .route("/users/me/password", put(change_password))
        .route("/users/me/stats", get(stats))
        .route("/users/me/achievements", get(achievements))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            session_auth_middleware,
        ))
        .with_state(state)
}

#[tracing::instrument(skip(state, session))]
async fn get_profile(
    State(state): State<AppState>,
    session: UserSession,
) -> Result<Json<UserResponse>, AppError> {
    Ok(Json(state.user_service.get_profile(session.user_id).await?))
}

/// Update name, email and reminder settings
#[tracing::instrument(skip(state, session, request))]
async fn update_profile(
    State(state): State<AppState>,
    session: UserSession,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    Ok(Json(
        state
            .user_service
            .update_profile(session.user_id, request)
            .await?,
    ))
}

#[tracing::instrument(skip(state, session, request))]
async fn change_password(
    State(state): State<AppState>,
    session: UserSession,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .user_service
        .change_password(session.user_id, request)
        .await?;
    Ok(Json(MessageResponse::new("Ihr Passwort wurde geändert.")))
}

/// Delete the account together with its progress and end the session
#[tracing::instrument(skip(state, jar, session))]
async fn delete_account(
    State(state): State<AppState>,
    jar: CookieJar,
    session: UserSession,
) -> Result<(CookieJar, Json<MessageResponse>), AppError> {
    state.user_service.delete_account(session.user_id).await?;
    state.auth_service.logout(&session).await?;
    Ok((
        jar.remove(session_cookie_removal()),
        Json(MessageResponse::new("Ihr Konto wurde gelöscht.")),
    ))
}

#[tracing::instrument(skip(state, session))]
async fn stats(
    State(state): State<AppState>,
    session: UserSession,
) -> Result<Json<UserStats>, AppError> {
    Ok(Json(state.user_service.stats(session.user_id).await?))
}

#[tracing::instrument(skip(state, session))]
async fn achievements(
    State(state): State<AppState>,
    session: UserSession,
) -> Result<Json<Vec<AchievementView>>, AppError> {
    Ok(Json(state.user_service.achievements(session.user_id).await?))
}
