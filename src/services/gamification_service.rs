//! Points, levels, streaks, perfect days and achievements.
//!
//! Everything here is pure: callers pass in the user snapshot, the day's
//! earlier activity and the local date, and persist whatever comes back.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use std::collections::{BTreeSet, HashSet};
use uuid::Uuid;

use crate::models::{
    AchievementId, AchievementStats, AchievementView, MuscleGroup, PointsBreakdown, Progress,
    ProgressStatus, User,
};

/// Points between level `L` and `L + 1` grow by this step times `L`.
pub const LEVEL_STEP_POINTS: i64 = 50;

/// Maps instants to calendar days at a fixed UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct LocalCalendar {
    offset: FixedOffset,
}

impl LocalCalendar {
    /// Offsets outside +-24h fall back to UTC.
    pub fn new(offset_minutes: i32) -> Self {
        let offset = offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix());
        Self { offset }
    }

    pub fn offset_seconds(&self) -> i32 {
        self.offset.local_minus_utc()
    }

    pub fn day_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    pub fn today(&self) -> NaiveDate {
        self.day_of(Utc::now())
    }

    /// Half-open UTC range `[start, end)` covering the local day.
    pub fn day_bounds(&self, day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let local_midnight = day.and_time(NaiveTime::MIN);
        let utc_midnight =
            local_midnight - Duration::seconds(i64::from(self.offset.local_minus_utc()));
        let start = Utc.from_utc_datetime(&utc_midnight);
        (start, start + Duration::days(1))
    }
}

impl Default for LocalCalendar {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Points needed to reach `level`.
pub fn points_for_level(level: i32) -> i64 {
    let level = i64::from(level.max(1));
    LEVEL_STEP_POINTS * level * (level - 1)
}

pub fn level_for_points(points: i32) -> i32 {
    let points = i64::from(points.max(0));
    let mut level = 1;
    while points_for_level(level + 1) <= points {
        level += 1;
    }
    level
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelProgress {
    pub level: i32,
    pub current_level_points: i64,
    pub next_level_points: i64,
    /// Share of the way from the current level to the next, 0.0..=1.0.
    pub progress_to_next: f64,
}

pub fn level_progress(points: i32) -> LevelProgress {
    let level = level_for_points(points);
    let current_level_points = points_for_level(level);
    let next_level_points = points_for_level(level + 1);
    let span = (next_level_points - current_level_points) as f64;
    let done = (i64::from(points.max(0)) - current_level_points) as f64;

    LevelProgress {
        level,
        current_level_points,
        next_level_points,
        progress_to_next: (done / span).clamp(0.0, 1.0),
    }
}

/// Streak after a completion on `day`.
pub fn advance_streak(current: i32, last_active: Option<NaiveDate>, day: NaiveDate) -> i32 {
    match last_active {
        Some(last) if last >= day => current.max(1),
        Some(last) if last.succ_opt() == Some(day) => current.saturating_add(1),
        _ => 1,
    }
}

/// Streak as it should be displayed on `today`: a missed day breaks it even
/// though the stored value is only rewritten on the next completion.
pub fn effective_streak(current: i32, last_active: Option<NaiveDate>, today: NaiveDate) -> i32 {
    match last_active {
        Some(last) if (today - last).num_days() <= 1 => current,
        _ => 0,
    }
}

/// What the user already did on the day being scored.
#[derive(Debug, Clone, Default)]
pub struct DayActivity {
    pub completed_exercises: HashSet<Uuid>,
    pub completed_groups: BTreeSet<MuscleGroup>,
    pub completions: i64,
    pub aborts: i64,
    pub points: i32,
}

impl DayActivity {
    pub fn from_progress(entries: &[Progress]) -> Self {
        let mut activity = DayActivity::default();
        for entry in entries {
            activity.points = activity.points.saturating_add(entry.points_awarded);
            match entry.status {
                ProgressStatus::Completed => {
                    activity.completions += 1;
                    activity.completed_exercises.insert(entry.exercise_id);
                    activity.completed_groups.insert(entry.muscle_group);
                }
                ProgressStatus::Aborted => activity.aborts += 1,
            }
        }
        activity
    }

    pub fn any_completion(&self) -> bool {
        self.completions > 0
    }

    pub fn all_groups_completed(&self) -> bool {
        MuscleGroup::all()
            .iter()
            .all(|group| self.completed_groups.contains(group))
    }

    pub fn missing_groups(&self) -> Vec<MuscleGroup> {
        MuscleGroup::all()
            .iter()
            .copied()
            .filter(|group| !self.completed_groups.contains(group))
            .collect()
    }
}

/// Totals over the user's whole history, excluding the attempt being scored.
#[derive(Debug, Clone, Default)]
pub struct LifetimeStats {
    pub completed_exercises: i64,
    pub trained_groups: BTreeSet<MuscleGroup>,
}

#[derive(Debug, Clone, Copy)]
pub struct Attempt {
    pub exercise_id: Uuid,
    pub muscle_group: MuscleGroup,
    pub status: ProgressStatus,
    pub day: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Award {
    pub points: PointsBreakdown,
    pub repeat: bool,
    pub perfect_day: bool,
    pub level_up: bool,
    pub new_achievements: Vec<AchievementId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GamificationRules {
    pub base_points: i32,
    pub streak_bonus_per_day: i32,
    pub streak_bonus_cap: i32,
    pub perfect_day_bonus: i32,
}

impl Default for GamificationRules {
    fn default() -> Self {
        Self {
            base_points: 10,
            streak_bonus_per_day: 2,
            streak_bonus_cap: 10,
            perfect_day_bonus: 50,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GamificationService {
    rules: GamificationRules,
}

impl GamificationService {
    pub fn new(rules: GamificationRules) -> Self {
        Self { rules }
    }

    /// Scores one attempt and applies it to `user`. Aborts leave the user untouched.
    pub fn apply(
        &self,
        user: &mut User,
        attempt: &Attempt,
        today: &DayActivity,
        lifetime: &LifetimeStats,
    ) -> Award {
        if attempt.status == ProgressStatus::Aborted {
            return Award::default();
        }

        let day = attempt.day;
        let repeat = today.completed_exercises.contains(&attempt.exercise_id);
        let first_of_day = !today.any_completion();

        user.current_streak = advance_streak(user.current_streak, user.last_active_date, day);
        user.longest_streak = user.longest_streak.max(user.current_streak);
        user.last_active_date = Some(user.last_active_date.map_or(day, |last| last.max(day)));

        let mut points = PointsBreakdown::default();
        if !repeat {
            points.base = self.rules.base_points;
        }
        if first_of_day {
            points.streak_bonus = self.rules.streak_bonus_per_day
                * user.current_streak.min(self.rules.streak_bonus_cap);
        }

        let mut groups_today = today.completed_groups.clone();
        groups_today.insert(attempt.muscle_group);
        let perfect_day = groups_today.len() == MuscleGroup::all().len()
            && user.last_perfect_day != Some(day);
        if perfect_day {
            points.perfect_day_bonus = self.rules.perfect_day_bonus;
            user.perfect_days = user.perfect_days.saturating_add(1);
            user.last_perfect_day = Some(day);
        }

        let previous_level = user.level;
        user.points = user.points.saturating_add(points.total());
        user.level = level_for_points(user.points);
        let level_up = user.level > previous_level;

        let mut trained_groups = lifetime.trained_groups.clone();
        trained_groups.insert(attempt.muscle_group);
        let stats = AchievementStats {
            completed_exercises: lifetime.completed_exercises + 1,
            current_streak: user.current_streak,
            perfect_days: user.perfect_days,
            trained_all_groups: trained_groups.len() == MuscleGroup::all().len(),
            level: user.level,
        };
        let new_achievements = unlock_achievements(user, &stats);

        Award {
            points,
            repeat,
            perfect_day,
            level_up,
            new_achievements,
        }
    }
}

/// Appends every earned but not yet held achievement and returns the new ones.
pub fn unlock_achievements(user: &mut User, stats: &AchievementStats) -> Vec<AchievementId> {
    let unlocked: Vec<AchievementId> = AchievementId::all()
        .iter()
        .copied()
        .filter(|id| !user.has_achievement(*id) && id.is_earned(stats))
        .collect();
    user.achievements.extend(unlocked.iter().copied());
    unlocked
}

/// Full catalogue with the user's unlocked flags, in catalogue order.
pub fn achievement_catalogue(user: &User) -> Vec<AchievementView> {
    AchievementId::all()
        .iter()
        .map(|id| AchievementView::new(*id, user.has_achievement(*id)))
        .collect()
}
