use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Router,
};
use axum_extra::extract::cookie::CookieJar;

use super::extract::Json;
use crate::auth::password::generate_token;
use crate::auth::{
    csrf_cookie, rate_limit_middleware, session_auth_middleware, session_cookie,
    session_cookie_removal, AuthResponse, AuthService, CsrfResponse, LoginRequest,
    MessageResponse, PasswordCheckRequest, PasswordStrengthResponse, RegisterRequest,
    UserSession, CSRF_TOKEN_LEN,
};
use crate::error::AppError;
use crate::models::UserResponse;
use crate::state::AppState;

/// Authentication routes
pub fn auth_routes(state: AppState) -> Router {
    let rate_limit =
        middleware::from_fn_with_state(state.rate_limiter.clone(), rate_limit_middleware);
    let session =
        middleware::from_fn_with_state(state.auth_service.clone(), session_auth_middleware);

    Router::new()
        .route("/auth/csrf", get(csrf_token))
        .route("/auth/register", post(register).route_layer(rate_limit.clone()))
        .route("/auth/login", post(login).route_layer(rate_limit))
        .route("/auth/password-strength", post(password_strength))
        .route("/auth/logout", post(logout).route_layer(session.clone()))
        .route("/auth/me", get(me).route_layer(session))
        .with_state(state)
}

/// Issue a fresh CSRF token as cookie and body
#[tracing::instrument(skip(state, jar))]
async fn csrf_token(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<CsrfResponse>) {
    let token = generate_token(CSRF_TOKEN_LEN);
    let jar = jar.add(csrf_cookie(token.clone(), state.config.cookie_secure));
    (jar, Json(CsrfResponse { csrf_token: token }))
}

fn with_session_cookie(state: &AppState, jar: CookieJar, response: &AuthResponse) -> CookieJar {
    jar.add(session_cookie(
        response.token.clone(),
        state.auth_service.session_ttl_seconds(),
        state.config.cookie_secure,
    ))
}

/// Register a new user
#[tracing::instrument(skip(state, jar, request))]
async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), AppError> {
    let response = state.auth_service.register(request).await?;
    let jar = with_session_cookie(&state, jar, &response);
    Ok((StatusCode::CREATED, jar, Json(response)))
}

/// Login user
#[tracing::instrument(skip(state, jar, request))]
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let response = state.auth_service.login(request).await?;
    let jar = with_session_cookie(&state, jar, &response);
    Ok((jar, Json(response)))
}

/// Strength feedback while the user types a new password
#[tracing::instrument(skip(auth_service, request))]
async fn password_strength(
    State(auth_service): State<AuthService>,
    Json(request): Json<PasswordCheckRequest>,
) -> Json<PasswordStrengthResponse> {
    Json(auth_service.check_password(&request.password))
}

/// Logout user
#[tracing::instrument(skip(auth_service, jar, session))]
async fn logout(
    State(auth_service): State<AuthService>,
    jar: CookieJar,
    session: UserSession,
) -> Result<(CookieJar, Json<MessageResponse>), AppError> {
    auth_service.logout(&session).await?;
    Ok((
        jar.remove(session_cookie_removal()),
        Json(MessageResponse::new("Sie wurden abgemeldet.")),
    ))
}

/// Current user
#[tracing::instrument(skip(auth_service, session))]
async fn me(
    State(auth_service): State<AuthService>,
    session: UserSession,
) -> Result<Json<UserResponse>, AppError> {
    Ok(Json(auth_service.me(&session).await?))
}
