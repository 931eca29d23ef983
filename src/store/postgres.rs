use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::{Executor, FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{Store, StoreError};
use crate::auth::UserRole;
use crate::models::{
    AchievementId, ActivityAggregate, ContactMessage, DailyActivity, Exercise, ExerciseCategory,
    ExerciseFilter, LevelBucket, MuscleGroup, MuscleGroupCount, Progress, ProgressCounts,
    ProgressStatus, TopExercise, User,
};

const USER_COLUMNS: &str = "id, email, name, password_hash, role, points, level, \
    current_streak, longest_streak, last_active_date, perfect_days, last_perfect_day, \
    achievements, reminder_enabled, reminder_time, created_at, updated_at, last_login_at";

const EXERCISE_COLUMNS: &str = "id, title, description, instructions, muscle_group, category, \
    video_id, thumbnail_url, duration_seconds, is_sitting, uses_theraband, is_dynamic, \
    is_unilateral, created_at, updated_at";

const PROGRESS_COLUMNS: &str =
    "id, user_id, exercise_id, muscle_group, status, watch_seconds, points_awarded, created_at";

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    name: String,
    password_hash: String,
    role: String,
    points: i32,
    level: i32,
    current_streak: i32,
    longest_streak: i32,
    last_active_date: Option<NaiveDate>,
    perfect_days: i32,
    last_perfect_day: Option<NaiveDate>,
    achievements: Vec<String>,
    reminder_enabled: bool,
    reminder_time: Option<NaiveTime>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_login_at: Option<DateTime<Utc>>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = UserRole::parse(&row.role)
            .ok_or_else(|| StoreError::Decode(format!("unknown role '{}'", row.role)))?;
        // Ids from a newer release are skipped rather than failing the whole user.
        let achievements = row
            .achievements
            .iter()
            .filter_map(|id| AchievementId::parse(id))
            .collect();

        Ok(User {
            id: row.id,
            email: row.email,
            name: row.name,
            password_hash: row.password_hash,
            role,
            points: row.points,
            level: row.level,
            current_streak: row.current_streak,
            longest_streak: row.longest_streak,
            last_active_date: row.last_active_date,
            perfect_days: row.perfect_days,
            last_perfect_day: row.last_perfect_day,
            achievements,
            reminder_enabled: row.reminder_enabled,
            reminder_time: row.reminder_time,
            created_at: row.created_at,
            updated_at: row.updated_at,
            last_login_at: row.last_login_at,
        })
    }
}

#[derive(FromRow)]
struct ExerciseRow {
    id: Uuid,
    title: String,
    description: String,
    instructions: Vec<String>,
    muscle_group: String,
    category: String,
    video_id: String,
    thumbnail_url: Option<String>,
    duration_seconds: i32,
    is_sitting: bool,
    uses_theraband: bool,
    is_dynamic: bool,
    is_unilateral: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn decode_group(value: &str) -> Result<MuscleGroup, StoreError> {
    MuscleGroup::parse(value)
        .ok_or_else(|| StoreError::Decode(format!("unknown muscle group '{value}'")))
}

impl TryFrom<ExerciseRow> for Exercise {
    type Error = StoreError;

    fn try_from(row: ExerciseRow) -> Result<Self, Self::Error> {
        let category = ExerciseCategory::parse(&row.category)
            .ok_or_else(|| StoreError::Decode(format!("unknown category '{}'", row.category)))?;

        Ok(Exercise {
            id: row.id,
            title: row.title,
            description: row.description,
            instructions: row.instructions,
            muscle_group: decode_group(&row.muscle_group)?,
            category,
            video_id: row.video_id,
            thumbnail_url: row.thumbnail_url,
            duration_seconds: row.duration_seconds,
            is_sitting: row.is_sitting,
            uses_theraband: row.uses_theraband,
            is_dynamic: row.is_dynamic,
            is_unilateral: row.is_unilateral,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct ProgressRow {
    id: Uuid,
    user_id: Uuid,
    exercise_id: Uuid,
    muscle_group: String,
    status: String,
    watch_seconds: i32,
    points_awarded: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProgressRow> for Progress {
    type Error = StoreError;

    fn try_from(row: ProgressRow) -> Result<Self, Self::Error> {
        let status = ProgressStatus::parse(&row.status)
            .ok_or_else(|| StoreError::Decode(format!("unknown status '{}'", row.status)))?;

        Ok(Progress {
            id: row.id,
            user_id: row.user_id,
            exercise_id: row.exercise_id,
            muscle_group: decode_group(&row.muscle_group)?,
            status,
            watch_seconds: row.watch_seconds,
            points_awarded: row.points_awarded,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct ContactRow {
    id: Uuid,
    name: String,
    email: String,
    subject: Option<String>,
    message: String,
    user_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl From<ContactRow> for ContactMessage {
    fn from(row: ContactRow) -> Self {
        ContactMessage {
            id: row.id,
            name: row.name,
            email: row.email,
            subject: row.subject,
            message: row.message,
            user_id: row.user_id,
            created_at: row.created_at,
        }
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, StoreError>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

/// Maps a unique violation to `Conflict` so callers can answer 409.
fn map_unique(err: sqlx::Error, what: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            StoreError::Conflict(what.to_string())
        }
        _ => StoreError::Database(err),
    }
}

fn achievement_names(user: &User) -> Vec<String> {
    user.achievements
        .iter()
        .map(|id| id.as_str().to_string())
        .collect()
}

fn push_flag(builder: &mut QueryBuilder<'_, Postgres>, column: &str, value: Option<bool>) {
    if let Some(value) = value {
        builder.push(format!(" AND {column} = ")).push_bind(value);
    }
}

async fn write_user<'e, E>(executor: E, user: &User) -> Result<(), StoreError>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        r#"
        UPDATE users SET
            email = $2, name = $3, password_hash = $4, role = $5, points = $6, level = $7,
            current_streak = $8, longest_streak = $9, last_active_date = $10,
            perfect_days = $11, last_perfect_day = $12, achievements = $13,
            reminder_enabled = $14, reminder_time = $15, updated_at = $16, last_login_at = $17
        WHERE id = $1
        "#,
    )
    .bind(user.id)
    .bind(&user.email)
    .bind(&user.name)
    .bind(&user.password_hash)
    .bind(user.role.as_str())
    .bind(user.points)
    .bind(user.level)
    .bind(user.current_streak)
    .bind(user.longest_streak)
    .bind(user.last_active_date)
    .bind(user.perfect_days)
    .bind(user.last_perfect_day)
    .bind(achievement_names(user))
    .bind(user.reminder_enabled)
    .bind(user.reminder_time)
    .bind(user.updated_at)
    .bind(user.last_login_at)
    .execute(executor)
    .await
    .map_err(|e| map_unique(e, "users.email"))?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound);
    }
    Ok(())
}

async fn insert_progress_row<'e, E>(executor: E, progress: &Progress) -> Result<(), StoreError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(&format!(
        "INSERT INTO progress ({PROGRESS_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
    ))
    .bind(progress.id)
    .bind(progress.user_id)
    .bind(progress.exercise_id)
    .bind(progress.muscle_group.as_str())
    .bind(progress.status.as_str())
    .bind(progress.watch_seconds)
    .bind(progress.points_awarded)
    .bind(progress.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

#[async_trait]
impl Store for PgStore {
    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(&format!(
            "INSERT INTO users ({USER_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)"
        ))
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.points)
        .bind(user.level)
        .bind(user.current_streak)
        .bind(user.longest_streak)
        .bind(user.last_active_date)
        .bind(user.perfect_days)
        .bind(user.last_perfect_day)
        .bind(achievement_names(user))
        .bind(user.reminder_enabled)
        .bind(user.reminder_time)
        .bind(user.created_at)
        .bind(user.updated_at)
        .bind(user.last_login_at)
        .execute(&self.db)
        .await
        .map_err(|e| map_unique(e, "users.email"))?;

        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn update_user(&self, user: &User) -> Result<(), StoreError> {
        write_user(&self.db, user).await
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_users(&self, limit: i64, offset: i64) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, email LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        convert_all(rows)
    }

    async fn count_users(&self) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }

    async fn count_users_created_since(&self, since: DateTime<Utc>) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE created_at >= $1")
            .bind(since)
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }

    async fn level_distribution(&self) -> Result<Vec<LevelBucket>, StoreError> {
        let rows: Vec<(i32, i64)> =
            sqlx::query_as("SELECT level, COUNT(*) FROM users GROUP BY level ORDER BY level")
                .fetch_all(&self.db)
                .await?;

        Ok(rows
            .into_iter()
            .map(|(level, users)| LevelBucket { level, users })
            .collect())
    }

    async fn insert_exercise(&self, exercise: &Exercise) -> Result<(), StoreError> {
        sqlx::query(&format!(
            "INSERT INTO exercises ({EXERCISE_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)"
        ))
        .bind(exercise.id)
        .bind(&exercise.title)
        .bind(&exercise.description)
        .bind(&exercise.instructions)
        .bind(exercise.muscle_group.as_str())
        .bind(exercise.category.as_str())
        .bind(&exercise.video_id)
        .bind(&exercise.thumbnail_url)
        .bind(exercise.duration_seconds)
        .bind(exercise.is_sitting)
        .bind(exercise.uses_theraband)
        .bind(exercise.is_dynamic)
        .bind(exercise.is_unilateral)
        .bind(exercise.created_at)
        .bind(exercise.updated_at)
        .execute(&self.db)
        .await
        .map_err(|e| map_unique(e, "exercises.id"))?;

        Ok(())
    }

    async fn find_exercise(&self, id: Uuid) -> Result<Option<Exercise>, StoreError> {
        let row = sqlx::query_as::<_, ExerciseRow>(&format!(
            "SELECT {EXERCISE_COLUMNS} FROM exercises WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(Exercise::try_from).transpose()
    }

    async fn list_exercises(&self, filter: &ExerciseFilter) -> Result<Vec<Exercise>, StoreError> {
        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
            "SELECT {EXERCISE_COLUMNS} FROM exercises WHERE TRUE"
        ));

        if let Some(group) = filter.muscle_group {
            builder.push(" AND muscle_group = ").push_bind(group.as_str());
        }
        if let Some(category) = filter.category {
            builder.push(" AND category = ").push_bind(category.as_str());
        }
        push_flag(&mut builder, "is_sitting", filter.sitting);
        push_flag(&mut builder, "uses_theraband", filter.theraband);
        push_flag(&mut builder, "is_dynamic", filter.dynamic);
        push_flag(&mut builder, "is_unilateral", filter.unilateral);
        if let Some(term) = filter.search_term() {
            let pattern = format!("%{}%", term.replace('%', "\\%").replace('_', "\\_"));
            builder
                .push(" AND (title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        builder.push(" ORDER BY muscle_group, title");

        let rows = builder
            .build_query_as::<ExerciseRow>()
            .fetch_all(&self.db)
            .await?;

        convert_all(rows)
    }

    async fn update_exercise(&self, exercise: &Exercise) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE exercises SET
                title = $2, description = $3, instructions = $4, muscle_group = $5,
                category = $6, video_id = $7, thumbnail_url = $8, duration_seconds = $9,
                is_sitting = $10, uses_theraband = $11, is_dynamic = $12, is_unilateral = $13,
                updated_at = $14
            WHERE id = $1
            "#,
        )
        .bind(exercise.id)
        .bind(&exercise.title)
        .bind(&exercise.description)
        .bind(&exercise.instructions)
        .bind(exercise.muscle_group.as_str())
        .bind(exercise.category.as_str())
        .bind(&exercise.video_id)
        .bind(&exercise.thumbnail_url)
        .bind(exercise.duration_seconds)
        .bind(exercise.is_sitting)
        .bind(exercise.uses_theraband)
        .bind(exercise.is_dynamic)
        .bind(exercise.is_unilateral)
        .bind(exercise.updated_at)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_exercise(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM exercises WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_exercises(&self) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM exercises")
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }

    async fn record_progress(&self, progress: &Progress, user: &User) -> Result<(), StoreError> {
        let mut tx = self.db.begin().await?;
        insert_progress_row(&mut *tx, progress).await?;
        write_user(&mut *tx, user).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn list_progress(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Progress>, StoreError> {
        let rows = sqlx::query_as::<_, ProgressRow>(&format!(
            "SELECT {PROGRESS_COLUMNS} FROM progress WHERE user_id = $1 \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        convert_all(rows)
    }

    async fn progress_between(
        &self,
        user_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Progress>, StoreError> {
        let rows = sqlx::query_as::<_, ProgressRow>(&format!(
            "SELECT {PROGRESS_COLUMNS} FROM progress \
             WHERE user_id = $1 AND created_at >= $2 AND created_at < $3 \
             ORDER BY created_at"
        ))
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.db)
        .await?;

        convert_all(rows)
    }

    async fn activity_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        utc_offset_seconds: i32,
        top_exercises: i64,
    ) -> Result<ActivityAggregate, StoreError> {
        let (completions, aborts, active_users, watch_seconds): (i64, i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    COUNT(*) FILTER (WHERE status = 'completed'),
                    COUNT(*) FILTER (WHERE status = 'aborted'),
                    COUNT(DISTINCT user_id),
                    COALESCE(SUM(watch_seconds), 0)::BIGINT
                FROM progress
                WHERE created_at >= $1 AND created_at < $2
                "#,
            )
            .bind(from)
            .bind(to)
            .fetch_one(&self.db)
            .await?;

        let daily: Vec<(NaiveDate, i64, i64, i64)> = sqlx::query_as(
            r#"
            SELECT
                ((created_at AT TIME ZONE 'UTC') + make_interval(secs => $3::double precision))::date AS day,
                COUNT(*) FILTER (WHERE status = 'completed'),
                COUNT(*) FILTER (WHERE status = 'aborted'),
                COUNT(DISTINCT user_id)
            FROM progress
            WHERE created_at >= $1 AND created_at < $2
            GROUP BY day
            ORDER BY day
            "#,
        )
        .bind(from)
        .bind(to)
        .bind(utc_offset_seconds)
        .fetch_all(&self.db)
        .await?;

        let per_group: Vec<(String, i64)> = sqlx::query_as(
            "SELECT muscle_group, COUNT(*) FROM progress \
             WHERE status = 'completed' AND created_at >= $1 AND created_at < $2 \
             GROUP BY muscle_group ORDER BY muscle_group",
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.db)
        .await?;

        let top: Vec<(Uuid, String, i64)> = sqlx::query_as(
            r#"
            SELECT p.exercise_id, COALESCE(e.title, '') AS title, COUNT(*) AS completions
            FROM progress p
            LEFT JOIN exercises e ON e.id = p.exercise_id
            WHERE p.status = 'completed' AND p.created_at >= $1 AND p.created_at < $2
            GROUP BY p.exercise_id, e.title
            ORDER BY completions DESC, title
            LIMIT $3
            "#,
        )
        .bind(from)
        .bind(to)
        .bind(top_exercises)
        .fetch_all(&self.db)
        .await?;

        Ok(ActivityAggregate {
            completions,
            aborts,
            active_users,
            watch_seconds,
            daily: daily
                .into_iter()
                .map(|(date, completions, aborts, active_users)| DailyActivity {
                    date,
                    completions,
                    aborts,
                    active_users,
                })
                .collect(),
            per_group: per_group
                .iter()
                .map(|(group, completions)| -> Result<MuscleGroupCount, StoreError> {
                    Ok(MuscleGroupCount {
                        muscle_group: decode_group(group)?,
                        completions: *completions,
                    })
                })
                .collect::<Result<_, _>>()?,
            top_exercises: top
                .into_iter()
                .map(|(exercise_id, title, completions)| TopExercise {
                    exercise_id,
                    title,
                    completions,
                })
                .collect(),
        })
    }

    async fn progress_counts(&self, user_id: Uuid) -> Result<ProgressCounts, StoreError> {
        let (completed, aborted): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE status = 'completed'),
                COUNT(*) FILTER (WHERE status = 'aborted')
            FROM progress
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        Ok(ProgressCounts { completed, aborted })
    }

    async fn completed_muscle_groups(&self, user_id: Uuid) -> Result<Vec<MuscleGroup>, StoreError> {
        let groups: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT muscle_group FROM progress \
             WHERE user_id = $1 AND status = 'completed' ORDER BY muscle_group",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        groups.iter().map(|group| decode_group(group)).collect()
    }

    async fn revoke_token(&self, jti: &str, expires_at: DateTime<Utc>) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM revoked_tokens WHERE expires_at <= NOW()")
            .execute(&self.db)
            .await?;
        sqlx::query(
            "INSERT INTO revoked_tokens (jti, expires_at) VALUES ($1, $2) ON CONFLICT (jti) DO NOTHING",
        )
        .bind(jti)
        .bind(expires_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn is_token_revoked(&self, jti: &str) -> Result<bool, StoreError> {
        let revoked: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM revoked_tokens WHERE jti = $1 AND expires_at > NOW())",
        )
        .bind(jti)
        .fetch_one(&self.db)
        .await?;

        Ok(revoked)
    }

    async fn insert_contact_message(&self, message: &ContactMessage) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO contact_messages (id, name, email, subject, message, user_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(message.id)
        .bind(&message.name)
        .bind(&message.email)
        .bind(&message.subject)
        .bind(&message.message)
        .bind(message.user_id)
        .bind(message.created_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn list_contact_messages(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ContactMessage>, StoreError> {
        let rows = sqlx::query_as::<_, ContactRow>(
            "SELECT id, name, email, subject, message, user_id, created_at \
             FROM contact_messages ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(ContactMessage::from).collect())
    }
}
