use serde::{Deserialize, Serialize};

/// Achievements a user can unlock. Unlocked ids are stored on the user and
/// never removed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AchievementId {
    FirstStep,
    TenExercises,
    FiftyExercises,
    HundredExercises,
    #[serde(rename = "streak_3")]
    Streak3,
    #[serde(rename = "streak_7")]
    Streak7,
    #[serde(rename = "streak_30")]
    Streak30,
    FirstPerfectDay,
    PerfectWeek,
    AllRounder,
    #[serde(rename = "level_5")]
    Level5,
    #[serde(rename = "level_10")]
    Level10,
}

/// Snapshot of the numbers achievements are judged against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AchievementStats {
    pub completed_exercises: i64,
    pub current_streak: i32,
    pub perfect_days: i32,
    pub trained_all_groups: bool,
    pub level: i32,
}

impl AchievementId {
    pub fn all() -> &'static [AchievementId] {
        &[
            AchievementId::FirstStep,
            AchievementId::TenExercises,
            AchievementId::FiftyExercises,
            AchievementId::HundredExercises,
            AchievementId::Streak3,
            AchievementId::Streak7,
            AchievementId::Streak30,
            AchievementId::FirstPerfectDay,
            AchievementId::PerfectWeek,
            AchievementId::AllRounder,
            AchievementId::Level5,
            AchievementId::Level10,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AchievementId::FirstStep => "first_step",
            AchievementId::TenExercises => "ten_exercises",
            AchievementId::FiftyExercises => "fifty_exercises",
            AchievementId::HundredExercises => "hundred_exercises",
            AchievementId::Streak3 => "streak_3",
            AchievementId::Streak7 => "streak_7",
            AchievementId::Streak30 => "streak_30",
            AchievementId::FirstPerfectDay => "first_perfect_day",
            AchievementId::PerfectWeek => "perfect_week",
            AchievementId::AllRounder => "all_rounder",
            AchievementId::Level5 => "level_5",
            AchievementId::Level10 => "level_10",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|id| id.as_str() == s)
    }

    pub fn title(&self) -> &'static str {
        match self {
            AchievementId::FirstStep => "Erster Schritt",
            AchievementId::TenExercises => "Zehn geschafft",
            AchievementId::FiftyExercises => "Fleißig dabei",
            AchievementId::HundredExercises => "Hundert Übungen",
            AchievementId::Streak3 => "Drei Tage am Stück",
            AchievementId::Streak7 => "Eine ganze Woche",
            AchievementId::Streak30 => "Ein Monat Ausdauer",
            AchievementId::FirstPerfectDay => "Perfekter Tag",
            AchievementId::PerfectWeek => "Sieben perfekte Tage",
            AchievementId::AllRounder => "Allrounder",
            AchievementId::Level5 => "Stufe 5",
            AchievementId::Level10 => "Stufe 10",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AchievementId::FirstStep => "Ihre erste Übung abgeschlossen.",
            AchievementId::TenExercises => "10 Übungen abgeschlossen.",
            AchievementId::FiftyExercises => "50 Übungen abgeschlossen.",
            AchievementId::HundredExercises => "100 Übungen abgeschlossen.",
            AchievementId::Streak3 => "An 3 Tagen hintereinander trainiert.",
            AchievementId::Streak7 => "An 7 Tagen hintereinander trainiert.",
            AchievementId::Streak30 => "An 30 Tagen hintereinander trainiert.",
            AchievementId::FirstPerfectDay => "An einem Tag alle Muskelgruppen trainiert.",
            AchievementId::PerfectWeek => "7 perfekte Tage erreicht.",
            AchievementId::AllRounder => "Jede Muskelgruppe mindestens einmal trainiert.",
            AchievementId::Level5 => "Stufe 5 erreicht.",
            AchievementId::Level10 => "Stufe 10 erreicht.",
        }
    }

    pub fn is_earned(&self, stats: &AchievementStats) -> bool {
        match self {
            AchievementId::FirstStep => stats.completed_exercises >= 1,
            AchievementId::TenExercises => stats.completed_exercises >= 10,
            AchievementId::FiftyExercises => stats.completed_exercises >= 50,
            AchievementId::HundredExercises => stats.completed_exercises >= 100,
            AchievementId::Streak3 => stats.current_streak >= 3,
            AchievementId::Streak7 => stats.current_streak >= 7,
            AchievementId::Streak30 => stats.current_streak >= 30,
            AchievementId::FirstPerfectDay => stats.perfect_days >= 1,
            AchievementId::PerfectWeek => stats.perfect_days >= 7,
            AchievementId::AllRounder => stats.trained_all_groups,
            AchievementId::Level5 => stats.level >= 5,
            AchievementId::Level10 => stats.level >= 10,
        }
    }
}

/// Catalogue entry as shown to a user.
#[derive(Debug, Clone, Serialize)]
pub struct AchievementView {
    pub id: AchievementId,
    pub title: &'static str,
    pub description: &'static str,
    pub unlocked: bool,
}

impl AchievementView {
    pub fn new(id: AchievementId, unlocked: bool) -> Self {
        Self {
            id,
            title: id.title(),
            description: id.description(),
            unlocked,
        }
    }
}
