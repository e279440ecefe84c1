//! # User model for registered parents
//!
//! Defines the two representations of an account:
//!
//! ## [`User`] (server only)
//!
//! The complete row from the `users` table. It derives [`sqlx::FromRow`] so it can be
//! loaded directly from queries and contains every column:
//!
//! - `id`: primary key (`BIGSERIAL`).
//! - `name`, `email`: `email` is always stored trimmed and lower-cased, which is what
//!   makes the `UNIQUE` constraint case-insensitive.
//! - `password_hash`: Argon2id PHC string.
//! - `profile_photo`: URL path of the uploaded photo (`/uploads/profile-photos/...`).
//! - `created_at`: audit timestamp.
//!
//! The [`User::to_info`] method projects this into a [`UserInfo`].
//!
//! ## [`UserInfo`]
//!
//! A client-safe subset returned by signup, login and the profile endpoints, and cached
//! on the device under the `user` key. It never carries the password hash.

use serde::{Deserialize, Serialize};

#[cfg(feature = "server")]
use chrono::{DateTime, Utc};
#[cfg(feature = "server")]
use sqlx::FromRow;

/// Full user record from the database.
#[cfg(feature = "server")]
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub profile_photo: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(feature = "server")]
impl User {
    /// Convert to UserInfo for client consumption.
    pub fn to_info(&self) -> UserInfo {
        UserInfo {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            profile_photo: self.profile_photo.clone(),
        }
    }
}

/// User information safe to send to the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserInfo {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub profile_photo: Option<String>,
}

/// Normalise an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
