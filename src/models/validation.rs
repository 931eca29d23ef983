use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::AppError;
use crate::models::{CreateExerciseRequest, UpdateExerciseRequest, MAX_WATCH_SECONDS};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]{2,}$").expect("email regex is valid")
});

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_MESSAGE_LEN: usize = 5000;
pub const MAX_PAGE_SIZE: i64 = 100;
pub const DEFAULT_PAGE_SIZE: i64 = 50;

pub fn validate_email(email: &str) -> Result<(), AppError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(AppError::Validation("Bitte geben Sie eine E-Mail-Adresse ein.".to_string()));
    }
    if email.len() > 255 || !EMAIL_RE.is_match(email) {
        return Err(AppError::Validation("Die E-Mail-Adresse ist ungültig.".to_string()));
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Bitte geben Sie einen Namen ein.".to_string()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::Validation(format!(
            "Der Name darf höchstens {MAX_NAME_LEN} Zeichen lang sein."
        )));
    }
    Ok(())
}

pub fn validate_watch_seconds(seconds: i32) -> Result<(), AppError> {
    if !(0..=MAX_WATCH_SECONDS).contains(&seconds) {
        return Err(AppError::Validation("Die Anschauzeit ist ungültig.".to_string()));
    }
    Ok(())
}

pub fn validate_points(points: i32) -> Result<(), AppError> {
    if points < 0 {
        return Err(AppError::Validation("Punkte dürfen nicht negativ sein.".to_string()));
    }
    Ok(())
}

fn require_text(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("Das Feld „{field}“ darf nicht leer sein.")));
    }
    Ok(())
}

fn validate_duration(seconds: i32) -> Result<(), AppError> {
    if seconds <= 0 || seconds > MAX_WATCH_SECONDS {
        return Err(AppError::Validation("Die Übungsdauer ist ungültig.".to_string()));
    }
    Ok(())
}

pub fn validate_create_exercise(request: &CreateExerciseRequest) -> Result<(), AppError> {
    require_text(&request.title, "Titel")?;
    require_text(&request.description, "Beschreibung")?;
    require_text(&request.video_id, "Video")?;
    validate_duration(request.duration_seconds)?;
    if request.instructions.iter().any(|step| step.trim().is_empty()) {
        return Err(AppError::Validation("Anleitungsschritte dürfen nicht leer sein.".to_string()));
    }
    Ok(())
}

pub fn validate_update_exercise(request: &UpdateExerciseRequest) -> Result<(), AppError> {
    if let Some(title) = &request.title {
        require_text(title, "Titel")?;
    }
    if let Some(description) = &request.description {
        require_text(description, "Beschreibung")?;
    }
    if let Some(video_id) = &request.video_id {
        require_text(video_id, "Video")?;
    }
    if let Some(duration) = request.duration_seconds {
        validate_duration(duration)?;
    }
    if let Some(steps) = &request.instructions {
        if steps.iter().any(|step| step.trim().is_empty()) {
            return Err(AppError::Validation("Anleitungsschritte dürfen nicht leer sein.".to_string()));
        }
    }
    Ok(())
}

pub fn validate_contact_message(name: &str, email: &str, message: &str) -> Result<(), AppError> {
    validate_name(name)?;
    validate_email(email)?;
    require_text(message, "Nachricht")?;
    if message.chars().count() > MAX_MESSAGE_LEN {
        return Err(AppError::Validation(format!(
            "Die Nachricht darf höchstens {MAX_MESSAGE_LEN} Zeichen lang sein."
        )));
    }
    Ok(())
}

/// Clamp client-supplied paging to sane bounds.
pub fn page_bounds(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = offset.unwrap_or(0).max(0);
    (limit, offset)
}
