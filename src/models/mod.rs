// Domain records and request/response shapes

pub mod achievement;
pub mod analytics;
pub mod contact;
pub mod exercise;
pub mod progress;
pub mod user;
pub mod validation;

pub use achievement::*;
pub use analytics::*;
pub use contact::*;
pub use exercise::*;
pub use progress::*;
pub use user::*;
pub use validation::*;
