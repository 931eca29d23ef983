use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    page_bounds, validate_watch_seconds, AchievementView, HistoryQuery, Progress,
    ProgressHistoryEntry, ProgressOutcome, SaveProgressRequest, TodaySummary,
};
use crate::services::gamification_service::{
    Attempt, DayActivity, GamificationService, LifetimeStats, LocalCalendar,
};
use crate::store::Store;

/// One async mutex per user so that concurrent saves of the same user are
/// scored one after another.
#[derive(Clone, Default)]
struct UserLocks {
    locks: Arc<Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>>,
}

impl UserLocks {
    fn lock_for(&self, user_id: Uuid) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // Drop entries nobody else holds so the map does not grow with every user ever seen.
        locks.retain(|id, lock| *id == user_id || Arc::strong_count(lock) > 1);
        locks.entry(user_id).or_default().clone()
    }
}

#[derive(Clone)]
pub struct ProgressService {
    store: Arc<dyn Store>,
    engine: GamificationService,
    calendar: LocalCalendar,
    locks: UserLocks,
}

impl ProgressService {
    pub fn new(store: Arc<dyn Store>, engine: GamificationService, calendar: LocalCalendar) -> Self {
        Self {
            store,
            engine,
            calendar,
            locks: UserLocks::default(),
        }
    }

    pub async fn save(
        &self,
        user_id: Uuid,
        request: SaveProgressRequest,
    ) -> Result<ProgressOutcome, AppError> {
        self.save_at(user_id, request, Utc::now()).await
    }

    /// Records an attempt made at `now` and applies its gamification effects.
    pub async fn save_at(
        &self,
        user_id: Uuid,
        request: SaveProgressRequest,
        now: DateTime<Utc>,
    ) -> Result<ProgressOutcome, AppError> {
        validate_watch_seconds(request.watch_seconds)?;
        let exercise = self
            .store
            .find_exercise(request.exercise_id)
            .await?
            .ok_or_else(|| AppError::not_found("Die Übung"))?;

        let lock = self.locks.lock_for(user_id);
        let _guard = lock.lock().await;

        let mut user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Das Benutzerkonto"))?;

        let day = self.calendar.day_of(now);
        let (start, end) = self.calendar.day_bounds(day);
        let today = DayActivity::from_progress(
            &self.store.progress_between(user_id, start, end).await?,
        );
        let counts = self.store.progress_counts(user_id).await?;
        let lifetime = LifetimeStats {
            completed_exercises: counts.completed,
            trained_groups: self
                .store
                .completed_muscle_groups(user_id)
                .await?
                .into_iter()
                .collect(),
        };

        let attempt = Attempt {
            exercise_id: exercise.id,
            muscle_group: exercise.muscle_group,
            status: request.status,
            day,
        };
        let award = self.engine.apply(&mut user, &attempt, &today, &lifetime);

        let progress = Progress {
            id: Uuid::new_v4(),
            user_id,
            exercise_id: exercise.id,
            muscle_group: exercise.muscle_group,
            status: request.status,
            watch_seconds: request.watch_seconds,
            points_awarded: award.points.total(),
            created_at: now,
        };
        user.updated_at = now;
        self.store.record_progress(&progress, &user).await?;

        if award.level_up {
            tracing::info!(user_id = %user_id, level = user.level, "level up");
        }
        if award.perfect_day {
            tracing::info!(user_id = %user_id, %day, "perfect day");
        }
        for achievement in &award.new_achievements {
            tracing::info!(user_id = %user_id, achievement = achievement.as_str(), "achievement unlocked");
        }

        Ok(ProgressOutcome {
            progress,
            points: award.points,
            points_earned: award.points.total(),
            total_points: user.points,
            level: user.level,
            level_up: award.level_up,
            current_streak: user.current_streak,
            longest_streak: user.longest_streak,
            repeat: award.repeat,
            perfect_day: award.perfect_day,
            new_achievements: award
                .new_achievements
                .into_iter()
                .map(|id| AchievementView::new(id, true))
                .collect(),
        })
    }

    /// Newest first, with the exercise title when the exercise still exists.
    pub async fn history(
        &self,
        user_id: Uuid,
        query: HistoryQuery,
    ) -> Result<Vec<ProgressHistoryEntry>, AppError> {
        let (limit, offset) = page_bounds(query.limit, query.offset);
        let entries = self.store.list_progress(user_id, limit, offset).await?;

        let mut titles: HashMap<Uuid, Option<String>> = HashMap::new();
        let mut history = Vec::with_capacity(entries.len());
        for progress in entries {
            if !titles.contains_key(&progress.exercise_id) {
                let title = self
                    .store
                    .find_exercise(progress.exercise_id)
                    .await?
                    .map(|exercise| exercise.title);
                titles.insert(progress.exercise_id, title);
            }
            let exercise_title = titles.get(&progress.exercise_id).cloned().flatten();
            history.push(ProgressHistoryEntry {
                progress,
                exercise_title,
            });
        }

        Ok(history)
    }

    pub async fn today(&self, user_id: Uuid) -> Result<TodaySummary, AppError> {
        self.summary_for(user_id, Utc::now()).await
    }

    pub async fn summary_for(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<TodaySummary, AppError> {
        let day = self.calendar.day_of(now);
        let (start, end) = self.calendar.day_bounds(day);
        let activity = DayActivity::from_progress(
            &self.store.progress_between(user_id, start, end).await?,
        );

        Ok(TodaySummary {
            date: day,
            completed_groups: activity.completed_groups.iter().copied().collect(),
            missing_groups: activity.missing_groups(),
            completions: activity.completions,
            aborts: activity.aborts,
            points_today: activity.points,
            perfect_day: activity.all_groups_completed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::UserRole;
    use crate::models::{Exercise, ExerciseCategory, MuscleGroup, ProgressStatus, User};
    use crate::store::MemoryStore;
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone};

    struct Fixture {
        service: ProgressService,
        store: Arc<MemoryStore>,
        user: User,
        exercises: Vec<Exercise>,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let user = User::new("erika@example.com", "Erika", "hash".to_string(), UserRole::User, Utc::now());
        store.insert_user(&user).await.unwrap();

        let mut exercises = Vec::new();
        for group in MuscleGroup::all() {
            let exercise = Exercise {
                id: Uuid::new_v4(),
                title: format!("Übung {}", group.name_de()),
                description: "Beschreibung".to_string(),
                instructions: vec![],
                muscle_group: *group,
                category: ExerciseCategory::Strength,
                video_id: "vid".to_string(),
                thumbnail_url: None,
                duration_seconds: 60,
                is_sitting: true,
                uses_theraband: false,
                is_dynamic: false,
                is_unilateral: false,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            };
            store.insert_exercise(&exercise).await.unwrap();
            exercises.push(exercise);
        }

        let service = ProgressService::new(
            store.clone(),
            GamificationService::default(),
            LocalCalendar::default(),
        );
        Fixture {
            service,
            store,
            user,
            exercises,
        }
    }

    fn completed(exercise: &Exercise) -> SaveProgressRequest {
        SaveProgressRequest {
            exercise_id: exercise.id,
            status: ProgressStatus::Completed,
            watch_seconds: 60,
        }
    }

    #[tokio::test]
    async fn test_streak_across_days() {
        let f = fixture().await;
        let monday = Utc.with_ymd_and_hms(2026, 3, 9, 10, 0, 0).unwrap();

        let first = f
            .service
            .save_at(f.user.id, completed(&f.exercises[0]), monday)
            .await
            .unwrap();
        let second = f
            .service
            .save_at(f.user.id, completed(&f.exercises[0]), monday + Duration::days(1))
            .await
            .unwrap();
        let after_gap = f
            .service
            .save_at(f.user.id, completed(&f.exercises[0]), monday + Duration::days(4))
            .await
            .unwrap();

        assert_eq!(first.current_streak, 1);
        assert_eq!(second.current_streak, 2);
        assert_eq!(second.points.streak_bonus, 4);
        assert_eq!(after_gap.current_streak, 1);
        assert_eq!(after_gap.longest_streak, 2);
    }

    #[tokio::test]
    async fn test_repeat_and_abort() {
        let f = fixture().await;
        let now = Utc.with_ymd_and_hms(2026, 3, 9, 10, 0, 0).unwrap();

        f.service
            .save_at(f.user.id, completed(&f.exercises[1]), now)
            .await
            .unwrap();
        let repeat = f
            .service
            .save_at(f.user.id, completed(&f.exercises[1]), now + Duration::minutes(5))
            .await
            .unwrap();
        let abort = f
            .service
            .save_at(
                f.user.id,
                SaveProgressRequest {
                    status: ProgressStatus::Aborted,
                    ..completed(&f.exercises[2])
                },
                now + Duration::minutes(10),
            )
            .await
            .unwrap();

        assert!(repeat.repeat);
        assert_eq!(repeat.points_earned, 0);
        assert_eq!(abort.points_earned, 0);
        assert_eq!(abort.total_points, 12);
        assert_eq!(abort.current_streak, 1);

        let summary = f
            .service
            .summary_for(f.user.id, now + Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(summary.completions, 2);
        assert_eq!(summary.aborts, 1);
        assert_eq!(summary.points_today, 12);
        assert_eq!(summary.completed_groups, vec![f.exercises[1].muscle_group]);
        assert_eq!(summary.missing_groups.len(), MuscleGroup::all().len() - 1);
    }

    #[tokio::test]
    async fn test_perfect_day_through_service() {
        let f = fixture().await;
        let now = Utc.with_ymd_and_hms(2026, 3, 9, 8, 0, 0).unwrap();

        let mut perfect = 0;
        for (i, exercise) in f.exercises.iter().enumerate() {
            let outcome = f
                .service
                .save_at(f.user.id, completed(exercise), now + Duration::minutes(i as i64))
                .await
                .unwrap();
            if outcome.perfect_day {
                perfect += 1;
            }
        }

        assert_eq!(perfect, 1);
        let user = f.store.find_user(f.user.id).await.unwrap().unwrap();
        assert_eq!(user.perfect_days, 1);
        assert_eq!(user.points, 102);
        assert_eq!(user.level, 2);
    }

    #[tokio::test]
    async fn test_deleted_exercise_still_counts_for_the_day() {
        let f = fixture().await;
        let now = Utc.with_ymd_and_hms(2026, 3, 9, 9, 0, 0).unwrap();

        let first = f
            .service
            .save_at(f.user.id, completed(&f.exercises[0]), now)
            .await
            .unwrap();
        assert!(f.store.delete_exercise(f.exercises[0].id).await.unwrap());
        let second = f
            .service
            .save_at(f.user.id, completed(&f.exercises[1]), now + Duration::minutes(5))
            .await
            .unwrap();

        assert_eq!(first.points.streak_bonus, 2);
        assert_eq!(second.points.streak_bonus, 0);
        assert_eq!(second.total_points, 22);

        let history = f
            .service
            .history(
                f.user.id,
                HistoryQuery {
                    limit: None,
                    offset: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].progress.exercise_id, f.exercises[0].id);
        assert_eq!(history[1].exercise_title, None);
    }

    #[tokio::test]
    async fn test_concurrent_saves_award_once() {
        let f = fixture().await;
        let now = Utc.with_ymd_and_hms(2026, 3, 9, 8, 0, 0).unwrap();

        let saves = (0..8).map(|_| {
            let service = f.service.clone();
            let request = completed(&f.exercises[0]);
            let user_id = f.user.id;
            tokio::spawn(async move { service.save_at(user_id, request, now).await })
        });
        let mut awarded = 0;
        for handle in saves.collect::<Vec<_>>() {
            if handle.await.unwrap().unwrap().points.base > 0 {
                awarded += 1;
            }
        }

        assert_eq!(awarded, 1);
    }

    #[tokio::test]
    async fn test_rejects_unknown_exercise_and_bad_watch_time() {
        let f = fixture().await;
        let unknown = f
            .service
            .save(
                f.user.id,
                SaveProgressRequest {
                    exercise_id: Uuid::new_v4(),
                    status: ProgressStatus::Completed,
                    watch_seconds: 10,
                },
            )
            .await;
        assert_matches!(unknown, Err(AppError::NotFound(_)));

        let negative = f
            .service
            .save(
                f.user.id,
                SaveProgressRequest {
                    watch_seconds: -5,
                    ..completed(&f.exercises[0])
                },
            )
            .await;
        assert_matches!(negative, Err(AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_history_carries_titles() {
        let f = fixture().await;
        let now = Utc.with_ymd_and_hms(2026, 3, 9, 8, 0, 0).unwrap();
        f.service
            .save_at(f.user.id, completed(&f.exercises[3]), now)
            .await
            .unwrap();

        let history = f
            .service
            .history(
                f.user.id,
                HistoryQuery {
                    limit: None,
                    offset: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].exercise_title.as_deref(), Some(f.exercises[3].title.as_str()));
    }
}
