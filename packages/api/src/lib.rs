//! # API crate: the MyBean backend
//!
//! HTTP backend for the parenting companion app. Parents sign up, log in with a bearer
//! token, keep a profile with a photo and onboarding survey answers, and share posts
//! on a community board where others like and save them.
//!
//! ## Modules
//!
//! | Module | Feature gate | Purpose |
//! |--------|-------------|---------|
//! | [`models`] | none | Wire types shared with the device-side `store` crate |
//! | [`auth`] | `server` | Argon2id password hashing, HS256 bearer tokens, the [`auth::AuthUser`] extractor |
//! | [`db`] | `server` | The [`db::Database`] trait with PostgreSQL and in-memory implementations |
//! | [`error`] | `server` | [`error::ApiError`], rendered as `{"error": "..."}` with a status code |
//! | [`routes`] | `server` | Axum handlers and [`routes::router`] |
//! | [`settings`] | `server` | Layered configuration (defaults, `config.toml`, `APP_*` env) |
//! | [`upload`] | `server` | Profile photo validation and storage under the upload directory |
//!
//! Without the `server` feature only [`models`] is compiled, which is what the client
//! crate links against.

pub mod models;

#[cfg(feature = "server")]
pub mod auth;
#[cfg(feature = "server")]
pub mod db;
#[cfg(feature = "server")]
pub mod error;
#[cfg(feature = "server")]
pub mod routes;
#[cfg(feature = "server")]
pub mod settings;
#[cfg(feature = "server")]
pub mod state;
#[cfg(feature = "server")]
pub mod upload;

pub use models::{PostInfo, UserInfo};

#[cfg(feature = "server")]
pub use routes::router;
#[cfg(feature = "server")]
pub use state::AppState;
