//! API Routes

pub mod auth;
pub mod forms;
pub mod groups;
pub mod health;
