//! Persistence behind a trait so services run against Postgres in
//! production and an in-memory map in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    ActivityAggregate, ContactMessage, Exercise, ExerciseFilter, LevelBucket, MuscleGroup,
    Progress, ProgressCounts, User,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Unique constraint violated: {0}")]
    Conflict(String),
    #[error("Record not found")]
    NotFound,
    #[error("Stored value could not be decoded: {0}")]
    Decode(String),
}

#[async_trait]
pub trait Store: Send + Sync {
    // Users
    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    /// Replace every mutable field. `NotFound` when the user is gone.
    async fn update_user(&self, user: &User) -> Result<(), StoreError>;
    /// Removes the user together with their progress.
    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError>;
    /// Newest first.
    async fn list_users(&self, limit: i64, offset: i64) -> Result<Vec<User>, StoreError>;
    async fn count_users(&self) -> Result<i64, StoreError>;
    async fn count_users_created_since(&self, since: DateTime<Utc>) -> Result<i64, StoreError>;
    async fn level_distribution(&self) -> Result<Vec<LevelBucket>, StoreError>;

    // Exercises
    async fn insert_exercise(&self, exercise: &Exercise) -> Result<(), StoreError>;
    async fn find_exercise(&self, id: Uuid) -> Result<Option<Exercise>, StoreError>;
    /// Ordered by muscle group, then title.
    async fn list_exercises(&self, filter: &ExerciseFilter) -> Result<Vec<Exercise>, StoreError>;
    async fn update_exercise(&self, exercise: &Exercise) -> Result<(), StoreError>;
    /// Progress rows that reference the exercise are kept.
    async fn delete_exercise(&self, id: Uuid) -> Result<bool, StoreError>;
    async fn count_exercises(&self) -> Result<i64, StoreError>;

    // Progress
    /// Stores the attempt and the user's updated score together: either both
    /// writes land or neither does.
    async fn record_progress(&self, progress: &Progress, user: &User) -> Result<(), StoreError>;
    /// Newest first.
    async fn list_progress(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Progress>, StoreError>;
    /// The user's records with `from <= created_at < to`, oldest first.
    async fn progress_between(
        &self,
        user_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Progress>, StoreError>;
    /// All users' attempts with `from <= created_at < to`. Days are bucketed
    /// after shifting timestamps by `utc_offset_seconds`.
    async fn activity_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        utc_offset_seconds: i32,
        top_exercises: i64,
    ) -> Result<ActivityAggregate, StoreError>;
    async fn progress_counts(&self, user_id: Uuid) -> Result<ProgressCounts, StoreError>;
    /// Distinct muscle groups the user has ever completed.
    async fn completed_muscle_groups(&self, user_id: Uuid) -> Result<Vec<MuscleGroup>, StoreError>;

    // Sessions
    async fn revoke_token(&self, jti: &str, expires_at: DateTime<Utc>) -> Result<(), StoreError>;
    async fn is_token_revoked(&self, jti: &str) -> Result<bool, StoreError>;

    // Contact
    async fn insert_contact_message(&self, message: &ContactMessage) -> Result<(), StoreError>;
    /// Newest first.
    async fn list_contact_messages(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ContactMessage>, StoreError>;
}
