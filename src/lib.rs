//! seniorfit: REST API for a senior-oriented exercise application.
//!
//! Users browse an exercise catalogue, log completed or aborted exercises
//! and collect points, levels, streaks and achievements. Admins manage
//! users and exercises and read aggregate analytics.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
pub mod store;

pub use error::AppError;
pub use state::AppState;
