use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body region an exercise trains. A perfect day needs every group.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum MuscleGroup {
    Arms,
    Legs,
    Core,
    Back,
    Shoulders,
}

impl MuscleGroup {
    pub fn all() -> &'static [MuscleGroup] {
        &[
            MuscleGroup::Arms,
            MuscleGroup::Legs,
            MuscleGroup::Core,
            MuscleGroup::Back,
            MuscleGroup::Shoulders,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MuscleGroup::Arms => "arms",
            MuscleGroup::Legs => "legs",
            MuscleGroup::Core => "core",
            MuscleGroup::Back => "back",
            MuscleGroup::Shoulders => "shoulders",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|group| group.as_str() == s)
    }

    pub fn name_de(&self) -> &'static str {
        match self {
            MuscleGroup::Arms => "Arme",
            MuscleGroup::Legs => "Beine",
            MuscleGroup::Core => "Rumpf",
            MuscleGroup::Back => "Rücken",
            MuscleGroup::Shoulders => "Schultern",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseCategory {
    Strength,
    Mobility,
    Balance,
    Coordination,
    Stretching,
}

impl ExerciseCategory {
    pub fn all() -> &'static [ExerciseCategory] {
        &[
            ExerciseCategory::Strength,
            ExerciseCategory::Mobility,
            ExerciseCategory::Balance,
            ExerciseCategory::Coordination,
            ExerciseCategory::Stretching,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseCategory::Strength => "strength",
            ExerciseCategory::Mobility => "mobility",
            ExerciseCategory::Balance => "balance",
            ExerciseCategory::Coordination => "coordination",
            ExerciseCategory::Stretching => "stretching",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|category| category.as_str() == s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub instructions: Vec<String>,
    pub muscle_group: MuscleGroup,
    pub category: ExerciseCategory,
    /// Identifier of the instructional video at the video provider.
    pub video_id: String,
    pub thumbnail_url: Option<String>,
    pub duration_seconds: i32,
    pub is_sitting: bool,
    pub uses_theraband: bool,
    pub is_dynamic: bool,
    pub is_unilateral: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateExerciseRequest {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub instructions: Vec<String>,
    pub muscle_group: MuscleGroup,
    pub category: ExerciseCategory,
    pub video_id: String,
    pub thumbnail_url: Option<String>,
    pub duration_seconds: i32,
    #[serde(default)]
    pub is_sitting: bool,
    #[serde(default)]
    pub uses_theraband: bool,
    #[serde(default)]
    pub is_dynamic: bool,
    #[serde(default)]
    pub is_unilateral: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateExerciseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub instructions: Option<Vec<String>>,
    pub muscle_group: Option<MuscleGroup>,
    pub category: Option<ExerciseCategory>,
    pub video_id: Option<String>,
    pub thumbnail_url: Option<String>,
    pub duration_seconds: Option<i32>,
    pub is_sitting: Option<bool>,
    pub uses_theraband: Option<bool>,
    pub is_dynamic: Option<bool>,
    pub is_unilateral: Option<bool>,
}

/// Query-string filter for the exercise list. Every field narrows the result.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExerciseFilter {
    pub muscle_group: Option<MuscleGroup>,
    pub category: Option<ExerciseCategory>,
    pub sitting: Option<bool>,
    pub theraband: Option<bool>,
    pub dynamic: Option<bool>,
    pub unilateral: Option<bool>,
    pub search: Option<String>,
}

impl ExerciseFilter {
    pub fn matches(&self, exercise: &Exercise) -> bool {
        if self.muscle_group.is_some_and(|g| g != exercise.muscle_group) {
            return false;
        }
        if self.category.is_some_and(|c| c != exercise.category) {
            return false;
        }
        if self.sitting.is_some_and(|v| v != exercise.is_sitting)
            || self.theraband.is_some_and(|v| v != exercise.uses_theraband)
            || self.dynamic.is_some_and(|v| v != exercise.is_dynamic)
            || self.unilateral.is_some_and(|v| v != exercise.is_unilateral)
        {
            return false;
        }
        match self.search_term() {
            Some(term) => {
                let term = term.to_lowercase();
                exercise.title.to_lowercase().contains(&term)
                    || exercise.description.to_lowercase().contains(&term)
            }
            None => true,
        }
    }

    /// Trimmed search text, `None` when blank.
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }
}
