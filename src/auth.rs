use std::borrow::ToOwned;
use std::time::Duration;

use argon2::{
    password_hash::{
        rand_core::OsRng, Error as PasswordHashError, PasswordHash, PasswordHasher,
        PasswordVerifier, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};
use sha2::{Digest, Sha256};
use thiserror::Error;
use time::OffsetDateTime;
use tokio::task;

/// Argon2 memory cost in kibibytes (~19 MB).
const ARGON2_MEMORY_COST: u32 = 19_456;
/// Argon2 time cost (iterations).
const ARGON2_TIME_COST: u32 = 2;
/// Argon2 parallelism (lanes).
const ARGON2_PARALLELISM: u32 = 1;
/// Length of the produced password hash output (bytes).
const ARGON2_OUTPUT_LENGTH: usize = 32;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication failed")]
    InvalidCredentials,
    #[error("Password hashing join error: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("Password hashing error: {0:?}")]
    PasswordHash(PasswordHashError),
    #[error("Argon2 error: {0:?}")]
    Argon2(argon2::Error),
}

/// Combine the optional pepper with the provided password.
fn combine_password_and_pepper(password: &str, pepper: Option<&str>) -> String {
    match pepper {
        Some(pepper) => {
            let mut combined = String::with_capacity(pepper.len() + password.len());
            combined.push_str(pepper);
            combined.push_str(password);
            combined
        }
        None => password.to_owned(),
    }
}

/// Create an Argon2 instance with the desired security parameters.
fn configured_argon2() -> Result<Argon2<'static>, AuthError> {
    let params = Params::new(
        ARGON2_MEMORY_COST,
        ARGON2_TIME_COST,
        ARGON2_PARALLELISM,
        Some(ARGON2_OUTPUT_LENGTH),
    )
    .map_err(AuthError::Argon2)?;

    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a password using Argon2id with strong parameters.
pub async fn hash_password(password: &str, pepper: Option<&str>) -> Result<String, AuthError> {
    let password = password.to_owned();
    let pepper = pepper.map(ToOwned::to_owned);

    Ok(task::spawn_blocking(move || {
        let password_material = combine_password_and_pepper(&password, pepper.as_deref());
        let argon2 = configured_argon2()?;
        let salt = SaltString::generate(&mut OsRng);
        let hash = argon2
            .hash_password(password_material.as_bytes(), &salt)
            .map_err(AuthError::PasswordHash)?
            .to_string();
        Ok::<_, AuthError>(hash)
    })
    .await??)
}

/// Verify a password against a stored hash. A mismatch is
/// [`AuthError::InvalidCredentials`]; everything else is a system error.
pub async fn verify_password(
    password: &str,
    stored_hash: &str,
    pepper: Option<&str>,
) -> Result<(), AuthError> {
    let password = password.to_owned();
    let stored_hash = stored_hash.to_owned();
    let pepper = pepper.map(ToOwned::to_owned);

    task::spawn_blocking(move || {
        let parsed_hash = PasswordHash::new(&stored_hash).map_err(AuthError::PasswordHash)?;
        let password_material = combine_password_and_pepper(&password, pepper.as_deref());
        let verifier = configured_argon2()?;

        match verifier.verify_password(password_material.as_bytes(), &parsed_hash) {
            Ok(_) => Ok(()),
            Err(PasswordHashError::Password) => Err(AuthError::InvalidCredentials),
            Err(err) => Err(AuthError::PasswordHash(err)),
        }
    })
    .await?
}

/// Compute the per-login confirmation token carried on the logout and delete
/// links. Derived from the user ID and the login instant, held only in the
/// session store, never persisted.
pub fn generate_logout_hash(user_id: i64) -> String {
    let now = OffsetDateTime::now_utc().unix_timestamp_nanos();
    let digest = Sha256::digest(format!("{user_id}:{now}").as_bytes());
    format!("{digest:x}")
}

/// Introduce a small random backoff when login fails to slow brute-force
/// attempts.
pub async fn randomized_backoff() {
    let base_delay = Duration::from_millis(150);
    let jitter = Duration::from_millis(fastrand::u64(0..150));
    tokio::time::sleep(base_delay + jitter).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn verify_accepts_matching_password() {
        let hash = hash_password("hunter2hunter2", None).await.unwrap();
        verify_password("hunter2hunter2", &hash, None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn verify_rejects_wrong_password() {
        let hash = hash_password("hunter2hunter2", None).await.unwrap();
        let err = verify_password("wrong-password", &hash, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn pepper_changes_the_verified_material() {
        let hash = hash_password("12345678", Some("pepper")).await.unwrap();
        assert!(verify_password("12345678", &hash, Some("pepper"))
            .await
            .is_ok());
        let err = verify_password("12345678", &hash, None).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[test]
    fn logout_hashes_are_unique_per_call() {
        let first = generate_logout_hash(1);
        let second = generate_logout_hash(1);
        assert_eq!(first.len(), 64);
        assert_ne!(first, second);
    }
}
