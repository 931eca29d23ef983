use chrono::{Duration, NaiveDate};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::AppError;
use crate::models::{
    AnalyticsResponse, DailyActivity, MuscleGroup, MuscleGroupCount, DEFAULT_ANALYTICS_DAYS,
    MAX_ANALYTICS_DAYS,
};
use crate::services::gamification_service::LocalCalendar;
use crate::store::Store;

const TOP_EXERCISES: i64 = 5;

/// Aggregates for the admin dashboard.
#[derive(Clone)]
pub struct AnalyticsService {
    store: Arc<dyn Store>,
    calendar: LocalCalendar,
}

impl AnalyticsService {
    pub fn new(store: Arc<dyn Store>, calendar: LocalCalendar) -> Self {
        Self { store, calendar }
    }

    pub async fn overview(&self, days: Option<i64>) -> Result<AnalyticsResponse, AppError> {
        self.overview_until(days, self.calendar.today()).await
    }

    /// Window of `days` local days ending with `today`, inclusive.
    pub async fn overview_until(
        &self,
        days: Option<i64>,
        today: NaiveDate,
    ) -> Result<AnalyticsResponse, AppError> {
        let days = days.unwrap_or(DEFAULT_ANALYTICS_DAYS);
        if !(1..=MAX_ANALYTICS_DAYS).contains(&days) {
            return Err(AppError::Validation(format!(
                "Der Zeitraum muss zwischen 1 und {MAX_ANALYTICS_DAYS} Tagen liegen."
            )));
        }

        let from = today - Duration::days(days - 1);
        let (start, _) = self.calendar.day_bounds(from);
        let (_, end) = self.calendar.day_bounds(today);
        let activity = self
            .store
            .activity_between(start, end, self.calendar.offset_seconds(), TOP_EXERCISES)
            .await?;

        let tallies: HashMap<NaiveDate, &DailyActivity> =
            activity.daily.iter().map(|day| (day.date, day)).collect();
        let daily = from
            .iter_days()
            .take(days as usize)
            .map(|date| {
                tallies.get(&date).map_or_else(
                    || DailyActivity {
                        date,
                        completions: 0,
                        aborts: 0,
                        active_users: 0,
                    },
                    |day| (*day).clone(),
                )
            })
            .collect();

        let per_group: HashMap<MuscleGroup, i64> = activity
            .per_group
            .iter()
            .map(|count| (count.muscle_group, count.completions))
            .collect();
        let muscle_groups = MuscleGroup::all()
            .iter()
            .map(|group| MuscleGroupCount {
                muscle_group: *group,
                completions: per_group.get(group).copied().unwrap_or(0),
            })
            .collect();

        let attempts = activity.completions + activity.aborts;
        Ok(AnalyticsResponse {
            days,
            from,
            to: today,
            total_users: self.store.count_users().await?,
            new_users: self.store.count_users_created_since(start).await?,
            active_users: activity.active_users,
            total_exercises: self.store.count_exercises().await?,
            completions: activity.completions,
            aborts: activity.aborts,
            abort_rate: ratio(activity.aborts, attempts),
            average_watch_seconds: ratio(activity.watch_seconds, attempts),
            daily,
            muscle_groups,
            top_exercises: activity.top_exercises,
            level_distribution: self.store.level_distribution().await?,
        })
    }
}

fn ratio(numerator: i64, denominator: i64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::UserRole;
    use crate::models::{Exercise, ExerciseCategory, Progress, ProgressStatus, User};
    use crate::store::MemoryStore;
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn exercise(title: &str, group: MuscleGroup) -> Exercise {
        Exercise {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: "Beschreibung".to_string(),
            instructions: vec![],
            muscle_group: group,
            category: ExerciseCategory::Balance,
            video_id: "vid".to_string(),
            thumbnail_url: None,
            duration_seconds: 60,
            is_sitting: false,
            uses_theraband: false,
            is_dynamic: false,
            is_unilateral: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn progress(user: &User, exercise: &Exercise, status: ProgressStatus, at: chrono::DateTime<Utc>) -> Progress {
        Progress {
            id: Uuid::new_v4(),
            user_id: user.id,
            exercise_id: exercise.id,
            muscle_group: exercise.muscle_group,
            status,
            watch_seconds: 100,
            points_awarded: 0,
            created_at: at,
        }
    }

    #[tokio::test]
    async fn test_overview_counts_and_zero_fills() {
        let store = Arc::new(MemoryStore::new());
        let user = User::new("a@example.com", "A", "hash".to_string(), UserRole::User, Utc::now());
        store.insert_user(&user).await.unwrap();
        let stand = exercise("Einbeinstand", MuscleGroup::Legs);
        let rows = exercise("Rudern", MuscleGroup::Back);
        store.insert_exercise(&stand).await.unwrap();
        store.insert_exercise(&rows).await.unwrap();

        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let noon = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        for entry in [
            progress(&user, &stand, ProgressStatus::Completed, noon),
            progress(&user, &stand, ProgressStatus::Completed, noon - Duration::days(2)),
            progress(&user, &rows, ProgressStatus::Aborted, noon - Duration::days(2)),
            progress(&user, &rows, ProgressStatus::Completed, noon - Duration::days(40)),
        ] {
            store.record_progress(&entry, &user).await.unwrap();
        }

        let service = AnalyticsService::new(store, LocalCalendar::default());
        let report = service.overview_until(Some(7), today).await.unwrap();

        assert_eq!(report.daily.len(), 7);
        assert_eq!(report.from, NaiveDate::from_ymd_opt(2026, 3, 4).unwrap());
        assert_eq!(report.completions, 2);
        assert_eq!(report.aborts, 1);
        assert!((report.abort_rate - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(report.active_users, 1);
        assert_eq!(report.total_exercises, 2);
        assert_eq!(report.daily[6].completions, 1);
        assert_eq!(report.daily[4].aborts, 1);
        assert_eq!(report.daily[0].completions, 0);
        assert_eq!(report.muscle_groups.len(), MuscleGroup::all().len());
        assert_eq!(report.top_exercises.len(), 1);
        assert_eq!(report.top_exercises[0].title, "Einbeinstand");
        assert_eq!(report.top_exercises[0].completions, 2);
    }

    #[tokio::test]
    async fn test_buckets_by_local_day_and_keeps_deleted_exercises() {
        let store = Arc::new(MemoryStore::new());
        let user = User::new("a@example.com", "A", "hash".to_string(), UserRole::User, Utc::now());
        store.insert_user(&user).await.unwrap();
        let stand = exercise("Einbeinstand", MuscleGroup::Legs);
        store.insert_exercise(&stand).await.unwrap();

        // 23:30 UTC on the 9th is already the 10th at UTC+1.
        let late = Utc.with_ymd_and_hms(2026, 3, 9, 23, 30, 0).unwrap();
        store
            .record_progress(&progress(&user, &stand, ProgressStatus::Completed, late), &user)
            .await
            .unwrap();
        store.delete_exercise(stand.id).await.unwrap();

        let service = AnalyticsService::new(store, LocalCalendar::new(60));
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let report = service.overview_until(Some(2), today).await.unwrap();

        assert_eq!(report.daily[0].completions, 0);
        assert_eq!(report.daily[1].completions, 1);
        assert_eq!(report.top_exercises.len(), 1);
        assert_eq!(report.top_exercises[0].exercise_id, stand.id);
        assert_eq!(report.top_exercises[0].title, "");
        assert_eq!(report.muscle_groups.iter().map(|g| g.completions).sum::<i64>(), 1);
    }

    #[tokio::test]
    async fn test_days_out_of_range() {
        let service = AnalyticsService::new(Arc::new(MemoryStore::new()), LocalCalendar::default());
        assert_matches!(service.overview(Some(0)).await, Err(AppError::Validation(_)));
        assert_matches!(service.overview(Some(366)).await, Err(AppError::Validation(_)));

        let report = service.overview(None).await.unwrap();
        assert_eq!(report.daily.len(), DEFAULT_ANALYTICS_DAYS as usize);
        assert_eq!(report.abort_rate, 0.0);
    }
}
