use axum::{
    extract::State,
    middleware,
    routing::get,
    Router,
};
use uuid::Uuid;

use super::extract::{Json, Path, Query};
use crate::auth::session_auth_middleware;
use crate::error::AppError;
use crate::models::{Exercise, ExerciseFilter};
use crate::state::AppState;

pub fn exercise_routes(state: AppState) -> Router {
    Router::new()
        .route("/exercises", get(list_exercises))
        .route("/exercises/:id", get(get_exercise))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            session_auth_middleware,
        ))
        .with_state(state)
}

/// List exercises, optionally filtered
#[tracing::instrument(skip(state))]
async fn list_exercises(
    State(state): State<AppState>,
    Query(filter): Query<ExerciseFilter>,
) -> Result<Json<Vec<Exercise>>, AppError> {
    Ok(Json(state.exercise_service.list(&filter).await?))
}

#[tracing::instrument(skip(state))]
async fn get_exercise(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Exercise>, AppError> {
    Ok(Json(state.exercise_service.get(id).await?))
}
