// Business logic services

pub mod analytics_service;
pub mod contact_service;
pub mod exercise_service;
pub mod gamification_service;
pub mod progress_service;
pub mod user_service;

pub use analytics_service::AnalyticsService;
pub use contact_service::ContactService;
pub use exercise_service::ExerciseService;
pub use gamification_service::{GamificationService, LocalCalendar};
pub use progress_service::ProgressService;
pub use user_service::UserService;
