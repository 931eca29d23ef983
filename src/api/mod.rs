// API routes and handlers

pub mod admin;
pub mod auth;
pub mod contact;
pub mod exercises;
pub mod extract;
pub mod health;
pub mod progress;
pub mod routes;
pub mod users;
