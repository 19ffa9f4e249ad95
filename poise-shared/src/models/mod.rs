/// Database models for Poise
///
/// # Models
///
/// - `user`: Registered accounts and their credentials
/// - `analysis`: Persisted coaching results, owned by a user
///
/// The HTTP layer and the orchestrator reach these through the traits in
/// [`crate::store`]; the functions here are the PostgreSQL queries behind
/// [`crate::store::PgStore`].

pub mod analysis;
pub mod user;
