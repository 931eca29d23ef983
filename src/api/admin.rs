use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Router,
};
use uuid::Uuid;

use super::extract::{Json, Path, Query};
use crate::auth::{admin_only_middleware, session_auth_middleware, MessageResponse, UserSession};
use crate::error::AppError;
use crate::models::{
    AdminUpdateUserRequest, AnalyticsQuery, AnalyticsResponse, ContactListQuery, ContactMessage,
    CreateExerciseRequest, Exercise, ListUsersQuery, UpdateExerciseRequest, UserListResponse,
    UserResponse,
};
use crate::state::AppState;

/// Admin endpoints. The session layer is added last so it runs first.
pub fn admin_routes(state: AppState) -> Router {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/users/:id", put(update_user).delete(delete_user))
        .route("/admin/analytics", get(analytics))
        .route("/admin/exercises", post(create_exercise))
        .route(
            "/admin/exercises/:id",
            put(update_exercise).delete(delete_exercise),
        )
        .route("/admin/contact-messages", get(contact_messages))
        .route_layer(middleware::from_fn(admin_only_middleware))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            session_auth_middleware,
        ))
        .with_state(state)
}

/// List all users (admin only)
#[tracing::instrument(skip(state))]
async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<UserListResponse>, AppError> {
    Ok(Json(state.user_service.list_users(query).await?))
}

#[tracing::instrument(skip(state, session, request), fields(admin_id = %session.user_id))]
async fn update_user(
    State(state): State<AppState>,
    session: UserSession,
    Path(id): Path<Uuid>,
    Json(request): Json<AdminUpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    Ok(Json(
        state
            .user_service
            .admin_update_user(session.user_id, id, request)
            .await?,
    ))
}

#[tracing::instrument(skip(state, session), fields(admin_id = %session.user_id))]
async fn delete_user(
    State(state): State<AppState>,
    session: UserSession,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    state.user_service.admin_delete_user(session.user_id, id).await?;
    Ok(Json(MessageResponse::new("Das Benutzerkonto wurde gelöscht.")))
}

#[tracing::instrument(skip(state))]
async fn analytics(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<AnalyticsResponse>, AppError> {
    Ok(Json(state.analytics_service.overview(query.days).await?))
}

#[tracing::instrument(skip(state, request))]
async fn create_exercise(
    State(state): State<AppState>,
    Json(request): Json<CreateExerciseRequest>,
) -> Result<(StatusCode, Json<Exercise>), AppError> {
    let exercise = state.exercise_service.create(request).await?;
    Ok((StatusCode::CREATED, Json(exercise)))
}

#[tracing::instrument(skip(state, request))]
async fn update_exercise(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateExerciseRequest>,
) -> Result<Json<Exercise>, AppError> {
    Ok(Json(state.exercise_service.update(id, request).await?))
}

#[tracing::instrument(skip(state))]
async fn delete_exercise(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    state.exercise_service.delete(id).await?;
    Ok(Json(MessageResponse::new("Die Übung wurde gelöscht.")))
}

#[tracing::instrument(skip(state))]
async fn contact_messages(
    State(state): State<AppState>,
    Query(query): Query<ContactListQuery>,
) -> Result<Json<Vec<ContactMessage>>, AppError> {
    Ok(Json(state.contact_service.list(query).await?))
}
