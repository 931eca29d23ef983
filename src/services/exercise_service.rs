use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    validate_create_exercise, validate_update_exercise, CreateExerciseRequest, Exercise,
    ExerciseFilter, UpdateExerciseRequest,
};
use crate::store::Store;

#[derive(Clone)]
pub struct ExerciseService {
    store: Arc<dyn Store>,
}

fn trimmed_steps(steps: Vec<String>) -> Vec<String> {
    steps.into_iter().map(|step| step.trim().to_string()).collect()
}

/// Blank thumbnails are stored as absent.
fn thumbnail(url: Option<String>) -> Option<String> {
    url.map(|url| url.trim().to_string()).filter(|url| !url.is_empty())
}

impl ExerciseService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list(&self, filter: &ExerciseFilter) -> Result<Vec<Exercise>, AppError> {
        Ok(self.store.list_exercises(filter).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Exercise, AppError> {
        self.store
            .find_exercise(id)
            .await?
            .ok_or_else(|| AppError::not_found("Die Übung"))
    }

    pub async fn create(&self, request: CreateExerciseRequest) -> Result<Exercise, AppError> {
        validate_create_exercise(&request)?;

        let now = Utc::now();
        let exercise = Exercise {
            id: Uuid::new_v4(),
            title: request.title.trim().to_string(),
            description: request.description.trim().to_string(),
            instructions: trimmed_steps(request.instructions),
            muscle_group: request.muscle_group,
            category: request.category,
            video_id: request.video_id.trim().to_string(),
            thumbnail_url: thumbnail(request.thumbnail_url),
            duration_seconds: request.duration_seconds,
            is_sitting: request.is_sitting,
            uses_theraband: request.uses_theraband,
            is_dynamic: request.is_dynamic,
            is_unilateral: request.is_unilateral,
            created_at: now,
            updated_at: now,
        };

        self.store.insert_exercise(&exercise).await?;
        tracing::info!(exercise_id = %exercise.id, title = %exercise.title, "exercise created");
        Ok(exercise)
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateExerciseRequest,
    ) -> Result<Exercise, AppError> {
        validate_update_exercise(&request)?;
        let mut exercise = self.get(id).await?;

        if let Some(title) = request.title {
            exercise.title = title.trim().to_string();
        }
        if let Some(description) = request.description {
            exercise.description = description.trim().to_string();
        }
        if let Some(steps) = request.instructions {
            exercise.instructions = trimmed_steps(steps);
        }
        if let Some(group) = request.muscle_group {
            exercise.muscle_group = group;
        }
        if let Some(category) = request.category {
            exercise.category = category;
        }
        if let Some(video_id) = request.video_id {
            exercise.video_id = video_id.trim().to_string();
        }
        if request.thumbnail_url.is_some() {
            exercise.thumbnail_url = thumbnail(request.thumbnail_url);
        }
        if let Some(duration) = request.duration_seconds {
            exercise.duration_seconds = duration;
        }
        exercise.is_sitting = request.is_sitting.unwrap_or(exercise.is_sitting);
        exercise.uses_theraband = request.uses_theraband.unwrap_or(exercise.uses_theraband);
        exercise.is_dynamic = request.is_dynamic.unwrap_or(exercise.is_dynamic);
        exercise.is_unilateral = request.is_unilateral.unwrap_or(exercise.is_unilateral);
        exercise.updated_at = Utc::now();

        self.store.update_exercise(&exercise).await?;
        tracing::info!(exercise_id = %exercise.id, "exercise updated");
        Ok(exercise)
    }

    /// Deleting an exercise also removes the progress recorded against it.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if !self.store.delete_exercise(id).await? {
            return Err(AppError::not_found("Die Übung"));
        }
        tracing::info!(exercise_id = %id, "exercise deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExerciseCategory, MuscleGroup};
    use crate::store::MemoryStore;
    use assert_matches::assert_matches;

    fn request(title: &str, group: MuscleGroup, sitting: bool) -> CreateExerciseRequest {
        CreateExerciseRequest {
            title: title.to_string(),
            description: "Langsam und kontrolliert".to_string(),
            instructions: vec![" Aufrecht sitzen ".to_string()],
            muscle_group: group,
            category: ExerciseCategory::Mobility,
            video_id: "abc123".to_string(),
            thumbnail_url: Some("  ".to_string()),
            duration_seconds: 120,
            is_sitting: sitting,
            uses_theraband: false,
            is_dynamic: true,
            is_unilateral: false,
        }
    }

    #[tokio::test]
    async fn test_create_trims_and_filters() {
        let service = ExerciseService::new(Arc::new(MemoryStore::new()));
        let created = service
            .create(request("Schulterkreisen", MuscleGroup::Shoulders, true))
            .await
            .unwrap();
        service
            .create(request("Kniebeuge am Stuhl", MuscleGroup::Legs, false))
            .await
            .unwrap();

        assert_eq!(created.instructions, vec!["Aufrecht sitzen".to_string()]);
        assert_eq!(created.thumbnail_url, None);

        let sitting = service
            .list(&ExerciseFilter {
                sitting: Some(true),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(sitting.len(), 1);
        assert_eq!(sitting[0].title, "Schulterkreisen");

        let search = service
            .list(&ExerciseFilter {
                search: Some("stuhl".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(search.len(), 1);
        assert_eq!(search[0].muscle_group, MuscleGroup::Legs);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let service = ExerciseService::new(Arc::new(MemoryStore::new()));
        let created = service
            .create(request("Rumpfdrehen", MuscleGroup::Core, true))
            .await
            .unwrap();

        let updated = service
            .update(
                created.id,
                UpdateExerciseRequest {
                    title: Some("Rumpfdrehen im Sitzen".to_string()),
                    uses_theraband: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Rumpfdrehen im Sitzen");
        assert!(updated.uses_theraband);
        assert!(updated.is_sitting);

        service.delete(created.id).await.unwrap();
        assert_matches!(service.get(created.id).await, Err(AppError::NotFound(_)));
        assert_matches!(service.delete(created.id).await, Err(AppError::NotFound(_)));
    }
}
