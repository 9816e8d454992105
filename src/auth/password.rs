use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use once_cell::sync::Lazy;

/// Hash checked when the username is unknown so both login paths cost the same.
static DUMMY_HASH: Lazy<String> = Lazy::new(|| hash_password("psyform-dummy-password").unwrap_or_default());

#[derive(Debug, thiserror::Error)]
#[error("password hashing failed: {0}")]
pub struct PasswordError(String);

/// Argon2id hash in PHC string format
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError(e.to_string()))
}

/// An unparseable stored hash counts as a mismatch.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(e) => {
            tracing::warn!("Stored password hash is not a valid PHC string: {}", e);
            false
        }
    }
}

pub fn dummy_hash() -> &'static str {
    &DUMMY_HASH
}

/// `hash_password` on the blocking pool
pub async fn hash_password_task(password: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| PasswordError(e.to_string()))?
}

/// `verify_password` on the blocking pool. A failed task counts as a mismatch.
pub async fn verify_password_task(password: String, stored_hash: String) -> bool {
    match tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash)).await {
        Ok(matched) => matched,
        Err(e) => {
            tracing::error!("Password verification task failed: {}", e);
            false
        }
    }
}
