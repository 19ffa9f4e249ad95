/// Authentication utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and policy checks
/// - [`jwt`]: Bearer token generation and validation
/// - [`middleware`]: Authorization header parsing and the per-request auth context
///
/// # Example
///
/// ```no_run
/// use poise_shared::auth::password::{hash_password, verify_password};
/// use poise_shared::auth::jwt::{create_token, validate_token, Claims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password1")?;
/// assert!(verify_password("user_password1", &hash)?);
///
/// let claims = Claims::new(Uuid::new_v4());
/// let token = create_token(&claims, "secret-key-at-least-32-bytes-long!!")?;
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;
pub mod password;
