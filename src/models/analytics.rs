use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::MuscleGroup;

pub const DEFAULT_ANALYTICS_DAYS: i64 = 30;
pub const MAX_ANALYTICS_DAYS: i64 = 365;

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub days: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsResponse {
    pub days: i64,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub total_users: i64,
    pub new_users: i64,
    pub active_users: i64,
    pub total_exercises: i64,
    pub completions: i64,
    pub aborts: i64,
    /// Share of attempts that were aborted, 0.0 when there were none.
    pub abort_rate: f64,
    pub average_watch_seconds: f64,
    pub daily: Vec<DailyActivity>,
    pub muscle_groups: Vec<MuscleGroupCount>,
    pub top_exercises: Vec<TopExercise>,
    pub level_distribution: Vec<LevelBucket>,
}

/// Progress in a time window, aggregated by the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityAggregate {
    pub completions: i64,
    pub aborts: i64,
    pub active_users: i64,
    pub watch_seconds: i64,
    /// Local days with at least one attempt, oldest first.
    pub daily: Vec<DailyActivity>,
    /// Groups with at least one completion.
    pub per_group: Vec<MuscleGroupCount>,
    /// Most completed first. Deleted exercises keep their counts with an empty title.
    pub top_exercises: Vec<TopExercise>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DailyActivity {
    pub date: NaiveDate,
    pub completions: i64,
    pub aborts: i64,
    pub active_users: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MuscleGroupCount {
    pub muscle_group: MuscleGroup,
    pub completions: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TopExercise {
    pub exercise_id: Uuid,
    pub title: String,
    pub completions: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LevelBucket {
    pub level: i32,
    pub users: i64,
}
