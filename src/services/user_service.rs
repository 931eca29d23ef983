use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::password::{
    hash_password, validate_password_strength, verify_password, PasswordPolicy,
};
use crate::auth::{AuthError, ChangePasswordRequest};
use crate::error::AppError;
use crate::models::{
    normalize_email, page_bounds, validate_email, validate_name, validate_points,
    AchievementId, AchievementView, AdminUpdateUserRequest, ListUsersQuery, UpdateProfileRequest,
    User, UserListResponse, UserResponse, UserStats,
};
use crate::services::gamification_service::{
    achievement_catalogue, effective_streak, level_for_points, level_progress, LocalCalendar,
};
use crate::store::Store;

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn Store>,
    password_policy: PasswordPolicy,
    bcrypt_cost: u32,
    calendar: LocalCalendar,
}

impl UserService {
    pub fn new(store: Arc<dyn Store>, bcrypt_cost: u32, calendar: LocalCalendar) -> Self {
        Self {
            store,
            password_policy: PasswordPolicy::default(),
            bcrypt_cost,
            calendar,
        }
    }

    async fn load(&self, user_id: Uuid) -> Result<User, AppError> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Das Benutzerkonto"))
    }

    fn response(&self, user: &User) -> UserResponse {
        UserResponse::from_user(user, self.calendar.today())
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<UserResponse, AppError> {
        let user = self.load(user_id).await?;
        Ok(self.response(&user))
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        request: UpdateProfileRequest,
    ) -> Result<UserResponse, AppError> {
        let mut user = self.load(user_id).await?;

        if let Some(name) = request.name {
            validate_name(&name)?;
            user.name = name.trim().to_string();
        }
        if let Some(email) = request.email {
            validate_email(&email)?;
            user.email = normalize_email(&email);
        }
        if let Some(enabled) = request.reminder_enabled {
            user.reminder_enabled = enabled;
        }
        if let Some(time) = request.reminder_time {
            user.reminder_time = time;
        }
        user.updated_at = Utc::now();

        self.store.update_user(&user).await?;
        Ok(self.response(&user))
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        request: ChangePasswordRequest,
    ) -> Result<(), AppError> {
        let mut user = self.load(user_id).await?;

        if !verify_password(&request.current_password, &user.password_hash)
            .map_err(AuthError::from)?
        {
            return Err(AppError::Validation("Das aktuelle Passwort ist falsch.".to_string()));
        }
        validate_password_strength(&request.new_password, &self.password_policy)
            .map_err(AuthError::from)?;

        user.password_hash =
            hash_password(&request.new_password, self.bcrypt_cost).map_err(AuthError::from)?;
        user.updated_at = Utc::now();
        self.store.update_user(&user).await?;

        tracing::info!(user_id = %user.id, "password changed");
        Ok(())
    }

    pub async fn delete_account(&self, user_id: Uuid) -> Result<(), AppError> {
        if !self.store.delete_user(user_id).await? {
            return Err(AppError::not_found("Das Benutzerkonto"));
        }
        tracing::info!(user_id = %user_id, "account deleted");
        Ok(())
    }

    pub async fn stats(&self, user_id: Uuid) -> Result<UserStats, AppError> {
        let user = self.load(user_id).await?;
        let counts = self.store.progress_counts(user_id).await?;
        let level = level_progress(user.points);

        Ok(UserStats {
            points: user.points,
            level: user.level,
            current_level_points: level.current_level_points,
            next_level_points: level.next_level_points,
            progress_to_next: level.progress_to_next,
            current_streak: effective_streak(
                user.current_streak,
                user.last_active_date,
                self.calendar.today(),
            ),
            longest_streak: user.longest_streak,
            perfect_days: user.perfect_days,
            completed_exercises: counts.completed,
            aborted_exercises: counts.aborted,
            achievements_unlocked: user.achievements.len(),
            achievements_total: AchievementId::all().len(),
        })
    }

    pub async fn achievements(&self, user_id: Uuid) -> Result<Vec<AchievementView>, AppError> {
        let user = self.load(user_id).await?;
        Ok(achievement_catalogue(&user))
    }

    // Admin operations

    pub async fn list_users(&self, query: ListUsersQuery) -> Result<UserListResponse, AppError> {
        let (limit, offset) = page_bounds(query.limit, query.offset);
        let users = self.store.list_users(limit, offset).await?;
        let total = self.store.count_users().await?;

        Ok(UserListResponse {
            users: users.iter().map(|user| self.response(user)).collect(),
            total,
            limit,
            offset,
        })
    }

    pub async fn admin_update_user(
        &self,
        admin_id: Uuid,
        user_id: Uuid,
        request: AdminUpdateUserRequest,
    ) -> Result<UserResponse, AppError> {
        let mut user = self.load(user_id).await?;

        if let Some(name) = request.name {
            validate_name(&name)?;
            user.name = name.trim().to_string();
        }
        if let Some(email) = request.email {
            validate_email(&email)?;
            user.email = normalize_email(&email);
        }
        if let Some(role) = request.role {
            if user_id == admin_id && role != user.role {
                return Err(AppError::Forbidden(
                    "Sie können Ihre eigene Rolle nicht ändern.".to_string(),
                ));
            }
            user.role = role;
        }
        if let Some(points) = request.points {
            validate_points(points)?;
            user.points = points;
            user.level = level_for_points(points);
        }
        user.updated_at = Utc::now();

        self.store.update_user(&user).await?;
        tracing::info!(admin_id = %admin_id, user_id = %user_id, "user updated by admin");
        Ok(self.response(&user))
    }

    pub async fn admin_delete_user(&self, admin_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        if admin_id == user_id {
            return Err(AppError::Forbidden(
                "Sie können Ihr eigenes Konto hier nicht löschen.".to_string(),
            ));
        }
        if !self.store.delete_user(user_id).await? {
            return Err(AppError::not_found("Das Benutzerkonto"));
        }
        tracing::info!(admin_id = %admin_id, user_id = %user_id, "user deleted by admin");
        Ok(())
    }
}
