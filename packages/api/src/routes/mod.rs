//! # HTTP routes
//!
//! | Method | Path | Auth | Handler |
//! |--------|------|------|---------|
//! | GET | `/health` | | [`health`] |
//! | POST | `/api/signup` | | [`auth::signup`] |
//! | POST | `/api/login` | | [`auth::login`] |
//! | GET | `/api/posts` | | [`posts::list_posts`] |
//! | POST | `/api/posts` | bearer | [`posts::create_post`] |
//! | GET | `/api/posts/{id}` | | [`posts::get_post`] |
//! | DELETE | `/api/posts/{id}` | bearer, owner | [`posts::delete_post`] |
//! | POST | `/api/posts/{id}/like` | bearer | [`posts::like_post`] |
//! | POST | `/api/posts/{id}/save` | bearer | [`posts::save_post`] |
//! | GET | `/api/user/likes` | bearer | [`posts::liked_posts`] |
//! | GET | `/api/user/saves` | bearer | [`posts::saved_posts`] |
//! | GET | `/api/user/posts` | bearer | [`posts::user_posts`] |
//! | GET, PUT | `/api/user/profile` | bearer | [`user::get_profile`], [`user::update_profile`] |
//! | POST, DELETE | `/api/user/profile-photo` | bearer | [`user::upload_photo`], [`user::delete_photo`] |
//! | POST, GET | `/api/survey` | bearer | [`survey::submit_survey`], [`survey::get_survey`] |
//!
//! Uploaded files are served read-only under `/uploads`. "bearer" routes take an
//! [`AuthUser`](crate::auth::AuthUser) argument and answer 401 without one.

use std::time::Duration;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::db::Database;
use crate::state::AppState;

pub mod auth;
pub mod posts;
pub mod survey;
pub mod user;

/// Slack on top of the photo size cap for multipart framing.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build the full application router.
pub fn router<D: Database>(state: AppState<D>) -> Router {
    let photo_limit = state.uploads.max_bytes + MULTIPART_OVERHEAD;
    let uploads_dir = state.uploads.dir.clone();

    let api = Router::new()
        .route("/signup", post(auth::signup::<D>))
        .route("/login", post(auth::login::<D>))
        .route(
            "/posts",
            get(posts::list_posts::<D>).post(posts::create_post::<D>),
        )
        .route(
            "/posts/{id}",
            get(posts::get_post::<D>).delete(posts::delete_post::<D>),
        )
        .route("/posts/{id}/like", post(posts::like_post::<D>))
        .route("/posts/{id}/save", post(posts::save_post::<D>))
        .route("/user/likes", get(posts::liked_posts::<D>))
        .route("/user/saves", get(posts::saved_posts::<D>))
        .route("/user/posts", get(posts::user_posts::<D>))
        .route(
            "/user/profile",
            get(user::get_profile::<D>).put(user::update_profile::<D>),
        )
        .route(
            "/user/profile-photo",
            post(user::upload_photo::<D>)
                .delete(user::delete_photo::<D>)
                .layer(DefaultBodyLimit::max(photo_limit)),
        )
        .route(
            "/survey",
            post(survey::submit_survey::<D>).get(survey::get_survey::<D>),
        );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health::<D>))
        .nest("/api", api)
        .nest_service("/uploads", ServeDir::new(uploads_dir))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Database round-trip; 500 `{ok: false}` when it fails.
pub async fn health<D: Database>(State(state): State<AppState<D>>) -> (StatusCode, Json<Value>) {
    match state.db.ping().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "ok": true }))),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unreachable");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "ok": false })))
        }
    }
}
