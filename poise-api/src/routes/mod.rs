/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `users`: Registration, login and profile
/// - `analyze`: Photo and voice analysis
/// - `history`: Past analyses of the current user

pub mod analyze;
pub mod health;
pub mod history;
pub mod users;
