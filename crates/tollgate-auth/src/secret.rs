//! Client secret hashing and verification.
//!
//! Client secrets are never stored in plaintext: registrations carry an
//! Argon2id hash in PHC string format, and presented secrets are verified
//! against it.
//!
//! # Example
//!
//! ```
//! use tollgate_auth::secret::{generate_client_secret, hash_client_secret, verify_client_secret};
//!
//! let secret = generate_client_secret();
//! let hash = hash_client_secret(&secret).unwrap();
//!
//! assert!(verify_client_secret(&secret, &hash).unwrap());
//! assert!(!verify_client_secret("wrong", &hash).unwrap());
//! ```

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::Rng;

use crate::AuthResult;
use crate::error::AuthError;

/// Generate a new random client secret (256 bits, hex encoded, `cs_` prefix).
#[must_use]
pub fn generate_client_secret() -> String {
    let bytes: [u8; 32] = rand::thread_rng().r#gen();
    format!("cs_{}", hex::encode(bytes))
}

/// Hash a client secret for storage using Argon2id with a random salt.
///
/// # Errors
///
/// Returns `argon2::password_hash::Error` if hashing fails (rare).
pub fn hash_client_secret(secret: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(secret.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a client secret against a stored Argon2 hash.
///
/// Returns `Ok(false)` on mismatch and `Err` only if `hash` is not a valid PHC string.
///
/// # Errors
///
/// Returns `argon2::password_hash::Error` if the stored hash cannot be parsed.
pub fn verify_client_secret(
    secret: &str,
    hash: &str,
) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    let result = Argon2::default().verify_password(secret.as_bytes(), &parsed_hash);
    Ok(result.is_ok())
}

/// Verify a client secret on the blocking thread pool.
///
/// # Errors
///
/// Returns `AuthError::Storage` if the stored hash is malformed, or
/// `AuthError::Internal` if the blocking task fails.
pub async fn verify_client_secret_async(secret: &str, hash: &str) -> AuthResult<bool> {
    let secret = secret.to_string();
    let hash = hash.to_string();

    tokio::task::spawn_blocking(move || verify_client_secret(&secret, &hash))
        .await
        .map_err(|e| AuthError::internal(format!("Secret verification task failed: {e}")))?
        .map_err(|e| AuthError::storage(format!("Stored client secret hash is malformed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_secret_format() {
        let secret = generate_client_secret();
        assert_eq!(secret.len(), 67);
        assert!(secret.starts_with("cs_"));
        assert!(secret[3..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generated_secrets_are_unique() {
        assert_ne!(generate_client_secret(), generate_client_secret());
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_client_secret("s3cret").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_client_secret("s3cret", &hash).unwrap());
        assert!(!verify_client_secret("other", &hash).unwrap());
    }

    #[test]
    fn test_malformed_hash_is_error() {
        assert!(verify_client_secret("s3cret", "plaintext").is_err());
    }

    #[tokio::test]
    async fn test_verify_async() {
        let hash = hash_client_secret("s3cret").unwrap();
        assert!(verify_client_secret_async("s3cret", &hash).await.unwrap());
        assert!(!verify_client_secret_async("nope", &hash).await.unwrap());

        let err = verify_client_secret_async("s3cret", "plaintext")
            .await
            .unwrap_err();
        assert!(err.is_server_error());
    }
}
