use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use lazy_static::lazy_static;
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::common::{AppError, AppResult};

pub const MIN_PASSWORD_LEN: usize = 6;
const GENERATED_PASSWORD_LEN: usize = 8;

lazy_static! {
    // Verified against when the account does not exist, so a miss costs
    // the same as a wrong password.
    static ref DUMMY_HASH: String =
        hash_blocking("chamber-timing-equaliser").unwrap_or_default();
}

// argon2 is CPU-bound; every call goes through the blocking pool.
async fn run_blocking<T, F>(f: F) -> AppResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("password task failed: {e}")))
}

fn hash_blocking(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("password hashing failed: {e}")))
}

fn verify_blocking(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Hash a password as an argon2id PHC string with a fresh salt.
pub async fn hash_password(password: &str) -> AppResult<String> {
    let password = password.to_owned();
    run_blocking(move || hash_blocking(&password)).await?
}

/// Malformed stored hashes verify as false.
pub async fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let password = password.to_owned();
    let password_hash = password_hash.to_owned();
    run_blocking(move || verify_blocking(&password, &password_hash)).await
}

/// Spend one verification's worth of work and discard the result.
pub async fn burn_verification(password: &str) -> AppResult<()> {
    let password = password.to_owned();
    run_blocking(move || {
        verify_blocking(&password, &DUMMY_HASH);
    })
    .await
}

/// Shared rule for registration and every reset path.
pub fn validate_new_password(password: &str, confirm_password: &str) -> AppResult<()> {
    if password != confirm_password {
        return Err(AppError::validation("Passwords do not match."));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long."
        )));
    }
    Ok(())
}

pub fn generate_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LEN)
        .map(char::from)
        .collect()
}
