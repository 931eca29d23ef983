use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::get,
    Router,
};

use super::extract::{Json, Query};
use crate::auth::{session_auth_middleware, UserSession};
use crate::error::AppError;
use crate::models::{
    HistoryQuery, ProgressHistoryEntry, ProgressOutcome, SaveProgressRequest, TodaySummary,
};
use crate::state::AppState;

pub fn progress_routes(state: AppState) -> Router {
    Router::new()
        .route("/progress", get(history).post(save_progress))
        .route("/progress/today", get(today))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            session_auth_middleware,
        ))
        .with_state(state)
}

/// Record a completed or aborted exercise and return the gamification result
#[tracing::instrument(skip(state, session, request), fields(user_id = %session.user_id))]
async fn save_progress(
    State(state): State<AppState>,
    session: UserSession,
    Json(request): Json<SaveProgressRequest>,
) -> Result<(StatusCode, Json<ProgressOutcome>), AppError> {
    let outcome = state.progress_service.save(session.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

#[tracing::instrument(skip(state, session))]
async fn history(
    State(state): State<AppState>,
    session: UserSession,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<ProgressHistoryEntry>>, AppError> {
    Ok(Json(state.progress_service.history(session.user_id, query).await?))
}

#[tracing::instrument(skip(state, session))]
async fn today(
    State(state): State<AppState>,
    session: UserSession,
) -> Result<Json<TodaySummary>, AppError> {
    Ok(Json(state.progress_service.today(session.user_id).await?))
}
