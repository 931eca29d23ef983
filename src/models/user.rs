use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::UserRole;
use crate::models::AchievementId;

/// Stored user record. Never serialized directly: it carries the password hash.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub role: UserRole,
    pub points: i32,
    pub level: i32,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub last_active_date: Option<NaiveDate>,
    pub perfect_days: i32,
    pub last_perfect_day: Option<NaiveDate>,
    pub achievements: Vec<AchievementId>,
    pub reminder_enabled: bool,
    pub reminder_time: Option<NaiveTime>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(
        email: &str,
        name: &str,
        password_hash: String,
        role: UserRole,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: normalize_email(email),
            name: name.trim().to_string(),
            password_hash,
            role,
            points: 0,
            level: 1,
            current_streak: 0,
            longest_streak: 0,
            last_active_date: None,
            perfect_days: 0,
            last_perfect_day: None,
            achievements: Vec::new(),
            reminder_enabled: false,
            reminder_time: None,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        }
    }

    pub fn has_achievement(&self, id: AchievementId) -> bool {
        self.achievements.contains(&id)
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Emails are unique case-insensitively; they are stored trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub points: i32,
    pub level: i32,
    /// Zero once a day has been missed, even before the next completion rewrites it.
    pub current_streak: i32,
    pub longest_streak: i32,
    pub perfect_days: i32,
    pub achievements: Vec<AchievementId>,
    pub reminder_enabled: bool,
    #[serde(with = "hh_mm")]
    pub reminder_time: Option<NaiveTime>,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl UserResponse {
    pub fn from_user(user: &User, today: NaiveDate) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            points: user.points,
            level: user.level,
            current_streak: crate::services::gamification_service::effective_streak(
                user.current_streak,
                user.last_active_date,
                today,
            ),
            longest_streak: user.longest_streak,
            perfect_days: user.perfect_days,
            achievements: user.achievements.clone(),
            reminder_enabled: user.reminder_enabled,
            reminder_time: user.reminder_time,
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub reminder_enabled: Option<bool>,
    /// Absent leaves the time alone, `null` clears it.
    #[serde(default, deserialize_with = "hh_mm::deserialize_patch")]
    pub reminder_time: Option<Option<NaiveTime>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AdminUpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<UserRole>,
    pub points: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserStats {
    pub points: i32,
    pub level: i32,
    pub current_level_points: i64,
    pub next_level_points: i64,
    pub progress_to_next: f64,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub perfect_days: i32,
    pub completed_exercises: i64,
    pub aborted_exercises: i64,
    pub achievements_unlocked: usize,
    pub achievements_total: usize,
}

/// `Option<NaiveTime>` as `"HH:MM"`.
pub mod hh_mm {
    use chrono::NaiveTime;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S>(value: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(time) => serializer.serialize_some(&time.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| NaiveTime::parse_from_str(s.trim(), FORMAT).map_err(D::Error::custom))
            .transpose()
    }

    /// Only called when the field is present, so `null` becomes `Some(None)`.
    pub fn deserialize_patch<'de, D>(deserializer: D) -> Result<Option<Option<NaiveTime>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize(deserializer).map(Some)
    }
}
