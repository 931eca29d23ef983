use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{AchievementView, MuscleGroup};

/// Longest watch time accepted for a single exercise (4 hours).
pub const MAX_WATCH_SECONDS: i32 = 4 * 60 * 60;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Completed,
    Aborted,
}

impl ProgressStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStatus::Completed => "completed",
            ProgressStatus::Aborted => "aborted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(ProgressStatus::Completed),
            "aborted" => Some(ProgressStatus::Aborted),
            _ => None,
        }
    }
}

/// One logged attempt of an exercise by a user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Progress {
    pub id: Uuid,
    pub user_id: Uuid,
    pub exercise_id: Uuid,
    /// Copied from the exercise when the attempt is saved.
    pub muscle_group: MuscleGroup,
    pub status: ProgressStatus,
    pub watch_seconds: i32,
    pub points_awarded: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressCounts {
    pub completed: i64,
    pub aborted: i64,
}

#[derive(Debug, Deserialize)]
pub struct SaveProgressRequest {
    pub exercise_id: Uuid,
    pub status: ProgressStatus,
    #[serde(default)]
    pub watch_seconds: i32,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressHistoryEntry {
    #[serde(flatten)]
    pub progress: Progress,
    pub exercise_title: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct PointsBreakdown {
    pub base: i32,
    pub streak_bonus: i32,
    pub perfect_day_bonus: i32,
}

impl PointsBreakdown {
    pub fn total(&self) -> i32 {
        self.base + self.streak_bonus + self.perfect_day_bonus
    }
}

/// Everything the client needs to show feedback after saving progress.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressOutcome {
    pub progress: Progress,
    pub points: PointsBreakdown,
    pub points_earned: i32,
    pub total_points: i32,
    pub level: i32,
    pub level_up: bool,
    pub current_streak: i32,
    pub longest_streak: i32,
    /// Repeated completion of an exercise already completed today.
    pub repeat: bool,
    pub perfect_day: bool,
    pub new_achievements: Vec<AchievementView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TodaySummary {
    pub date: NaiveDate,
    pub completed_groups: Vec<MuscleGroup>,
    pub missing_groups: Vec<MuscleGroup>,
    pub completions: i64,
    pub aborts: i64,
    pub points_today: i32,
    pub perfect_day: bool,
}
