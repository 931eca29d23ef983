use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Store, StoreError};
use crate::models::{
    ActivityAggregate, ContactMessage, DailyActivity, Exercise, ExerciseFilter, LevelBucket,
    MuscleGroup, MuscleGroupCount, Progress, ProgressCounts, ProgressStatus, TopExercise, User,
};

/// In-process store for tests and running without Postgres.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    exercises: RwLock<HashMap<Uuid, Exercise>>,
    progress: RwLock<Vec<Progress>>,
    revoked_tokens: RwLock<HashMap<String, DateTime<Utc>>>,
    contact_messages: RwLock<Vec<ContactMessage>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn page<T: Clone>(items: &[T], limit: i64, offset: i64) -> Vec<T> {
    items
        .iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .cloned()
        .collect()
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if users.values().any(|existing| existing.email == user.email) {
            return Err(StoreError::Conflict("users.email".to_string()));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn update_user(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|existing| existing.id != user.id && existing.email == user.email)
        {
            return Err(StoreError::Conflict("users.email".to_string()));
        }
        match users.get_mut(&user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        let removed = self.users.write().await.remove(&id).is_some();
        if removed {
            self.progress.write().await.retain(|p| p.user_id != id);
            for message in self.contact_messages.write().await.iter_mut() {
                if message.user_id == Some(id) {
                    message.user_id = None;
                }
            }
        }
        Ok(removed)
    }

    async fn list_users(&self, limit: i64, offset: i64) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().await;
        let mut sorted: Vec<User> = users.values().cloned().collect();
        sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.email.cmp(&b.email)));
        Ok(page(&sorted, limit, offset))
    }

    async fn count_users(&self) -> Result<i64, StoreError> {
        Ok(self.users.read().await.len() as i64)
    }

    async fn count_users_created_since(&self, since: DateTime<Utc>) -> Result<i64, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .filter(|user| user.created_at >= since)
            .count() as i64)
    }

    async fn level_distribution(&self) -> Result<Vec<LevelBucket>, StoreError> {
        let mut buckets: BTreeMap<i32, i64> = BTreeMap::new();
        for user in self.users.read().await.values() {
            *buckets.entry(user.level).or_default() += 1;
        }
        Ok(buckets
            .into_iter()
            .map(|(level, users)| LevelBucket { level, users })
            .collect())
    }

    async fn insert_exercise(&self, exercise: &Exercise) -> Result<(), StoreError> {
        let mut exercises = self.exercises.write().await;
        if exercises.contains_key(&exercise.id) {
            return Err(StoreError::Conflict("exercises.id".to_string()));
        }
        exercises.insert(exercise.id, exercise.clone());
        Ok(())
    }

    async fn find_exercise(&self, id: Uuid) -> Result<Option<Exercise>, StoreError> {
        Ok(self.exercises.read().await.get(&id).cloned())
    }

    async fn list_exercises(&self, filter: &ExerciseFilter) -> Result<Vec<Exercise>, StoreError> {
        let mut exercises: Vec<Exercise> = self
            .exercises
            .read()
            .await
            .values()
            .filter(|exercise| filter.matches(exercise))
            .cloned()
            .collect();
        exercises.sort_by(|a, b| {
            a.muscle_group
                .as_str()
                .cmp(b.muscle_group.as_str())
                .then_with(|| a.title.cmp(&b.title))
        });
        Ok(exercises)
    }

    async fn update_exercise(&self, exercise: &Exercise) -> Result<(), StoreError> {
        match self.exercises.write().await.get_mut(&exercise.id) {
            Some(existing) => {
                *existing = exercise.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn delete_exercise(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.exercises.write().await.remove(&id).is_some())
    }

    async fn count_exercises(&self) -> Result<i64, StoreError> {
        Ok(self.exercises.read().await.len() as i64)
    }

    async fn record_progress(&self, progress: &Progress, user: &User) -> Result<(), StoreError> {
        // Users before progress, the same order delete_user takes them in.
        let mut users = self.users.write().await;
        let mut entries = self.progress.write().await;
        if users
            .values()
            .any(|existing| existing.id != user.id && existing.email == user.email)
        {
            return Err(StoreError::Conflict("users.email".to_string()));
        }
        let existing = users.get_mut(&user.id).ok_or(StoreError::NotFound)?;
        *existing = user.clone();
        entries.push(progress.clone());
        Ok(())
    }

    async fn list_progress(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Progress>, StoreError> {
        let progress = self.progress.read().await;
        let mut entries: Vec<Progress> = progress
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page(&entries, limit, offset))
    }

    async fn progress_between(
        &self,
        user_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Progress>, StoreError> {
        let progress = self.progress.read().await;
        let mut entries: Vec<Progress> = progress
            .iter()
            .filter(|p| p.user_id == user_id && p.created_at >= from && p.created_at < to)
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(entries)
    }

    async fn activity_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        utc_offset_seconds: i32,
        top_exercises: i64,
    ) -> Result<ActivityAggregate, StoreError> {
        let progress = self.progress.read().await;
        let shift = Duration::seconds(i64::from(utc_offset_seconds));

        let mut aggregate = ActivityAggregate::default();
        let mut users: HashSet<Uuid> = HashSet::new();
        let mut days: BTreeMap<NaiveDate, (i64, i64, HashSet<Uuid>)> = BTreeMap::new();
        let mut groups: BTreeMap<MuscleGroup, i64> = BTreeMap::new();
        let mut exercises: HashMap<Uuid, i64> = HashMap::new();

        for p in progress.iter().filter(|p| p.created_at >= from && p.created_at < to) {
            let day = days.entry((p.created_at + shift).date_naive()).or_default();
            day.2.insert(p.user_id);
            users.insert(p.user_id);
            aggregate.watch_seconds += i64::from(p.watch_seconds);
            match p.status {
                ProgressStatus::Completed => {
                    aggregate.completions += 1;
                    day.0 += 1;
                    *groups.entry(p.muscle_group).or_default() += 1;
                    *exercises.entry(p.exercise_id).or_default() += 1;
                }
                ProgressStatus::Aborted => {
                    aggregate.aborts += 1;
                    day.1 += 1;
                }
            }
        }

        aggregate.active_users = users.len() as i64;
        aggregate.daily = days
            .into_iter()
            .map(|(date, (completions, aborts, users))| DailyActivity {
                date,
                completions,
                aborts,
                active_users: users.len() as i64,
            })
            .collect();
        aggregate.per_group = groups
            .into_iter()
            .map(|(muscle_group, completions)| MuscleGroupCount {
                muscle_group,
                completions,
            })
            .collect();

        let catalogue = self.exercises.read().await;
        let mut ranked: Vec<TopExercise> = exercises
            .into_iter()
            .map(|(exercise_id, completions)| TopExercise {
                exercise_id,
                title: catalogue
                    .get(&exercise_id)
                    .map(|exercise| exercise.title.clone())
                    .unwrap_or_default(),
                completions,
            })
            .collect();
        ranked.sort_by(|a, b| b.completions.cmp(&a.completions).then_with(|| a.title.cmp(&b.title)));
        ranked.truncate(top_exercises.max(0) as usize);
        aggregate.top_exercises = ranked;

        Ok(aggregate)
    }

    async fn progress_counts(&self, user_id: Uuid) -> Result<ProgressCounts, StoreError> {
        let progress = self.progress.read().await;
        let mut counts = ProgressCounts::default();
        for p in progress.iter().filter(|p| p.user_id == user_id) {
            match p.status {
                ProgressStatus::Completed => counts.completed += 1,
                ProgressStatus::Aborted => counts.aborted += 1,
            }
        }
        Ok(counts)
    }

    async fn completed_muscle_groups(&self, user_id: Uuid) -> Result<Vec<MuscleGroup>, StoreError> {
        let groups: BTreeSet<MuscleGroup> = self
            .progress
            .read()
            .await
            .iter()
            .filter(|p| p.user_id == user_id && p.status == ProgressStatus::Completed)
            .map(|p| p.muscle_group)
            .collect();
        Ok(groups.into_iter().collect())
    }

    async fn revoke_token(&self, jti: &str, expires_at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut revoked = self.revoked_tokens.write().await;
        let now = Utc::now();
        revoked.retain(|_, expiry| *expiry > now);
        revoked.entry(jti.to_string()).or_insert(expires_at);
        Ok(())
    }

    async fn is_token_revoked(&self, jti: &str) -> Result<bool, StoreError> {
        Ok(self
            .revoked_tokens
            .read()
            .await
            .get(jti)
            .is_some_and(|expiry| *expiry > Utc::now()))
    }

    async fn insert_contact_message(&self, message: &ContactMessage) -> Result<(), StoreError> {
        self.contact_messages.write().await.push(message.clone());
        Ok(())
    }

    async fn list_contact_messages(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ContactMessage>, StoreError> {
        let mut messages = self.contact_messages.read().await.clone();
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page(&messages, limit, offset))
    }
}
