//! # Password hashing and verification with Argon2id
//!
//! Provides the functions used by the signup and login handlers:
//!
//! - [`hash_password`]: generates a random salt via [`OsRng`], hashes the plaintext
//!   password with the default Argon2id parameters, and returns the result as a
//!   PHC-format string (e.g. `$argon2id$v=19$m=19456,t=2,p=1$...`). This string is
//!   stored in the `password_hash` column of the `users` table.
//!
//! - [`verify_password`]: parses a PHC-format hash and checks whether the provided
//!   plaintext matches. Returns `Ok(true)` on success, `Ok(false)` on mismatch, or
//!   `Err` if the stored hash is malformed.
//!
//! - [`verify_password_or_dummy`]: the login path. When no account matches the email it
//!   still runs a full verification against a fixed dummy hash, so an unknown email and
//!   a wrong password cost the same time.

use std::sync::OnceLock;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a password using Argon2id. Returns a PHC-format string.
pub fn hash_password(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| format!("Failed to hash password: {}", e))?;
    Ok(hash.to_string())
}

/// Verify a password against a PHC-format hash string.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, String> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| format!("Invalid password hash: {}", e))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Verify against `hash`, or against a dummy hash when there is no account.
/// Always returns `Ok(false)` in the latter case.
pub fn verify_password_or_dummy(password: &str, hash: Option<&str>) -> Result<bool, String> {
    static DUMMY: OnceLock<Result<String, String>> = OnceLock::new();

    match hash {
        Some(hash) => verify_password(password, hash),
        None => {
            let dummy = DUMMY
                .get_or_init(|| hash_password("not-a-real-account-password"))
                .as_ref()
                .map_err(Clone::clone)?;
            verify_password(password, dummy)?;
            Ok(false)
        }
    }
}
