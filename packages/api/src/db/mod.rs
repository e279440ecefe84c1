//! # Persistence behind one trait
//!
//! Every handler talks to storage through the [`Database`] trait, so the same router
//! runs against PostgreSQL in production and against an in-process store in tests and
//! in `memory` demo mode.
//!
//! ## Implementations
//!
//! | Type | Backing | Atomicity |
//! |------|---------|-----------|
//! | [`PgDatabase`] | `sqlx` pool, schema from `migrations/` | One transaction per multi-statement operation; toggles lock the post row. |
//! | [`MemoryDatabase`] | `BTreeMap`s behind one `Mutex` | Every operation holds the lock for its whole duration. |
//!
//! ## Counter invariant
//!
//! `likes_count` / `saves_count` always equal the number of join rows for the post.
//! [`Database::toggle`] flips membership and then recomputes the counter from the join
//! table inside the same atomic section, so concurrent toggles cannot make them drift.

use std::future::Future;

use serde_json::Value;
use thiserror::Error;

use crate::models::{Interaction, NewPost, PostInfo, PostQuery, ToggleOutcome, User};

mod memory;
mod pool;
mod postgres;

pub use memory::MemoryDatabase;
pub use pool::{connect, migrate};
pub use postgres::PgDatabase;

#[derive(Error, Debug)]
pub enum DbError {
    /// A unique constraint rejected the write.
    #[error("duplicate entry")]
    Duplicate,

    #[error(transparent)]
    Sqlx(sqlx::Error),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

impl From<sqlx::Error> for DbError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::Database(db) if db.is_unique_violation() => DbError::Duplicate,
            _ => DbError::Sqlx(error),
        }
    }
}

/// Result of an owner-only delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    Forbidden,
}

/// A profile photo change: the updated user and the reference it replaced.
#[derive(Debug, Clone)]
pub struct PhotoChange {
    pub user: User,
    pub previous: Option<String>,
}

/// Storage operations used by the request handlers.
pub trait Database: Clone + Send + Sync + 'static {
    /// Round-trip to the backing store.
    fn ping(&self) -> impl Future<Output = Result<(), DbError>> + Send;

    /// Insert a user; `DbError::Duplicate` when the email is taken.
    fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> impl Future<Output = Result<User, DbError>> + Send;

    fn find_user_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<User>, DbError>> + Send;

    fn find_user(&self, id: i64) -> impl Future<Output = Result<Option<User>, DbError>> + Send;

    fn update_user_name(
        &self,
        id: i64,
        name: &str,
    ) -> impl Future<Output = Result<Option<User>, DbError>> + Send;

    /// Replace (or clear) the photo reference, returning the previous one.
    fn set_profile_photo(
        &self,
        id: i64,
        photo: Option<&str>,
    ) -> impl Future<Output = Result<Option<PhotoChange>, DbError>> + Send;

    /// Insert or replace the survey blob of a user.
    fn upsert_survey(
        &self,
        user_id: i64,
        data: &Value,
    ) -> impl Future<Output = Result<(), DbError>> + Send;

    fn get_survey(&self, user_id: i64)
        -> impl Future<Output = Result<Option<Value>, DbError>> + Send;

    fn create_post(
        &self,
        user_id: i64,
        post: &NewPost,
    ) -> impl Future<Output = Result<PostInfo, DbError>> + Send;

    /// Newest first, with `author` filled in.
    fn list_posts(
        &self,
        query: &PostQuery,
    ) -> impl Future<Output = Result<Vec<PostInfo>, DbError>> + Send;

    /// With `author` and `author_email` filled in.
    fn get_post(&self, id: i64) -> impl Future<Output = Result<Option<PostInfo>, DbError>> + Send;

    /// Delete a post and its likes and saves, if `user_id` owns it.
    fn delete_post(
        &self,
        id: i64,
        user_id: i64,
    ) -> impl Future<Output = Result<DeleteOutcome, DbError>> + Send;

    /// Flip the (post, user) membership atomically. `None` when the post does not exist.
    fn toggle(
        &self,
        interaction: Interaction,
        post_id: i64,
        user_id: i64,
    ) -> impl Future<Output = Result<Option<ToggleOutcome>, DbError>> + Send;

    fn liked_post_ids(&self, user_id: i64)
        -> impl Future<Output = Result<Vec<i64>, DbError>> + Send;

    /// Most recently saved first, with `author` filled in.
    fn saved_posts(&self, user_id: i64)
        -> impl Future<Output = Result<Vec<PostInfo>, DbError>> + Send;

    /// Newest first.
    fn user_posts(&self, user_id: i64)
        -> impl Future<Output = Result<Vec<PostInfo>, DbError>> + Send;
}
