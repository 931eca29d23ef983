use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;
use crate::store::StoreError;

/// Error type returned by services and handlers.
///
/// The response body is `{"error": <code>, "message": <text>}`; `message` is
/// shown to users as-is by the client, so it is German.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    /// The request could not be read: malformed JSON, bad path or query.
    #[error("{0}")]
    InvalidRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Forbidden(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Database error: {0}")]
    Store(#[from] StoreError),
    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(what: &str) -> Self {
        AppError::NotFound(format!("{what} wurde nicht gefunden."))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(reason = %rejection.body_text(), "rejected request body");
        let message = match rejection {
            JsonRejection::MissingJsonContentType(_) => {
                "Die Anfrage muss als JSON gesendet werden."
            }
            JsonRejection::JsonSyntaxError(_) => "Die Anfrage enthält kein gültiges JSON.",
            JsonRejection::JsonDataError(_) => {
                "Die Anfrage enthält fehlende oder ungültige Felder."
            }
            _ => "Die Anfrage konnte nicht gelesen werden.",
        };
        AppError::InvalidRequest(message.to_string())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(reason = %rejection.body_text(), "rejected path");
        AppError::InvalidRequest("Die Adresse enthält eine ungültige Kennung.".to_string())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!(reason = %rejection.body_text(), "rejected query string");
        AppError::InvalidRequest("Die Filterangaben sind ungültig.".to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Validation(message) => (StatusCode::BAD_REQUEST, "validation_failed", message),
            AppError::InvalidRequest(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            AppError::Conflict(message) => (StatusCode::CONFLICT, "conflict", message),
            AppError::Forbidden(message) => (StatusCode::FORBIDDEN, "forbidden", message),
            AppError::Auth(err) => return err.into_response(),
            AppError::Store(StoreError::NotFound) => (
                StatusCode::NOT_FOUND,
                "not_found",
                "Der Eintrag wurde nicht gefunden.".to_string(),
            ),
            AppError::Store(StoreError::Conflict(target)) => (
                StatusCode::CONFLICT,
                "conflict",
                conflict_message(&target).to_string(),
            ),
            AppError::Store(err) => {
                tracing::error!(error = %err, "store failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Es ist ein Fehler aufgetreten. Bitte versuchen Sie es später erneut.".to_string(),
                )
            }
            AppError::Internal(err) => {
                tracing::error!(error = ?err, "internal failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Es ist ein Fehler aufgetreten. Bitte versuchen Sie es später erneut.".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": code, "message": message }))).into_response()
    }
}

fn conflict_message(target: &str) -> &'static str {
    match target {
        "users.email" => "Diese E-Mail-Adresse wird bereits verwendet.",
        "exercises.id" => "Diese Übung existiert bereits.",
        _ => "Der Eintrag existiert bereits.",
    }
}
