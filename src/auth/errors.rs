use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("User not found")]
    UserNotFound,
    #[error("Email already exists")]
    EmailAlreadyExists,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Missing session")]
    MissingSession,
    #[error("Invalid authorization header format")]
    InvalidAuthHeaderFormat,
    #[error("Insufficient permissions")]
    InsufficientPermissions,
    #[error("CSRF token missing or invalid")]
    CsrfMismatch,
    #[error("Rate limit exceeded")]
    RateLimitExceeded,
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("Password hashing error: {0}")]
    PasswordHashing(#[from] crate::auth::password::PasswordError),
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AuthError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                "E-Mail-Adresse oder Passwort ist falsch.".to_string(),
            ),
            AuthError::UserNotFound => (
                StatusCode::UNAUTHORIZED,
                "user_not_found",
                "Ihr Konto wurde nicht gefunden. Bitte melden Sie sich erneut an.".to_string(),
            ),
            AuthError::EmailAlreadyExists => (
                StatusCode::CONFLICT,
                "email_exists",
                "Diese E-Mail-Adresse wird bereits verwendet.".to_string(),
            ),
            AuthError::InvalidToken | AuthError::Jwt(_) => (
                StatusCode::UNAUTHORIZED,
                "invalid_session",
                "Ihre Sitzung ist ungültig. Bitte melden Sie sich erneut an.".to_string(),
            ),
            AuthError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "session_expired",
                "Ihre Sitzung ist abgelaufen. Bitte melden Sie sich erneut an.".to_string(),
            ),
            AuthError::MissingSession | AuthError::InvalidAuthHeaderFormat => (
                StatusCode::UNAUTHORIZED,
                "not_authenticated",
                "Bitte melden Sie sich an.".to_string(),
            ),
            AuthError::InsufficientPermissions => (
                StatusCode::FORBIDDEN,
                "forbidden",
                "Dafür fehlen Ihnen die Berechtigungen.".to_string(),
            ),
            AuthError::CsrfMismatch => (
                StatusCode::FORBIDDEN,
                "csrf_mismatch",
                "Die Anfrage konnte nicht bestätigt werden. Bitte laden Sie die Seite neu.".to_string(),
            ),
            AuthError::RateLimitExceeded => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                "Zu viele Versuche. Bitte warten Sie einige Minuten.".to_string(),
            ),
            AuthError::PasswordHashing(err) if err.is_policy_violation() => (
                StatusCode::BAD_REQUEST,
                "validation_failed",
                err.message_de().to_string(),
            ),
            AuthError::Store(StoreError::Conflict(_)) => (
                StatusCode::CONFLICT,
                "email_exists",
                "Diese E-Mail-Adresse wird bereits verwendet.".to_string(),
            ),
            AuthError::Store(_) | AuthError::PasswordHashing(_) | AuthError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "Es ist ein Fehler aufgetreten. Bitte versuchen Sie es später erneut.".to_string(),
            ),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        if status.is_server_error() {
            tracing::error!(error = %self, "authentication failure");
        } else if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!(error = %self, "request rejected");
        }

        let body = Json(json!({
            "error": code,
            "message": message,
        }));

        (status, body).into_response()
    }
}
