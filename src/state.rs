use axum::extract::FromRef;
use chrono::Duration;
use std::sync::Arc;

use crate::auth::{AuthService, RateLimitConfig, RateLimiter};
use crate::config::AppConfig;
use crate::services::{
    AnalyticsService, ContactService, ExerciseService, GamificationService, LocalCalendar,
    ProgressService, UserService,
};
use crate::store::Store;

/// Shared handles for every request handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub exercise_service: ExerciseService,
    pub progress_service: ProgressService,
    pub analytics_service: AnalyticsService,
    pub contact_service: ContactService,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: AppConfig) -> Self {
        let calendar = LocalCalendar::new(config.timezone_offset_minutes);

        Self {
            auth_service: AuthService::new(
                store.clone(),
                &config.jwt_secret,
                Duration::hours(config.session_ttl_hours),
                config.bcrypt_cost,
                calendar,
            ),
            user_service: UserService::new(store.clone(), config.bcrypt_cost, calendar),
            exercise_service: ExerciseService::new(store.clone()),
            progress_service: ProgressService::new(
                store.clone(),
                GamificationService::default(),
                calendar,
            ),
            analytics_service: AnalyticsService::new(store.clone(), calendar),
            contact_service: ContactService::new(store),
            rate_limiter: RateLimiter::new(RateLimitConfig::default()),
            config: Arc::new(config),
        }
    }
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        state.auth_service.clone()
    }
}

impl FromRef<AppState> for RateLimiter {
    fn from_ref(state: &AppState) -> Self {
        state.rate_limiter.clone()
    }
}
