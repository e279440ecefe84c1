//! Account creation and login.
//!
//! Emails are normalised (trimmed, lower-cased) before every lookup, so `A@B.com` and
//! `a@b.com` are the same account. Login answers an unknown email and a wrong password
//! with the same 401 body.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use tracing::info;

use crate::auth::{hash_password, verify_password_or_dummy};
use crate::db::{Database, DbError};
use crate::error::ApiError;
use crate::models::{normalize_email, AuthResponse, LoginRequest, SignupRequest, User};
use crate::state::AppState;

const INVALID_CREDENTIALS: &str = "Invalid credentials";

fn respond<D>(state: &AppState<D>, user: &User) -> Result<Json<AuthResponse>, ApiError> {
    let token = state
        .tokens
        .issue(user.id, &user.email)
        .map_err(ApiError::internal)?;
    Ok(Json(AuthResponse {
        user: user.to_info(),
        token,
    }))
}

pub async fn signup<D: Database>(
    State(state): State<AppState<D>>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(request) = payload?;
    let name = request.name.trim().to_string();
    let email = normalize_email(&request.email);

    if name.is_empty() || email.is_empty() || request.password.is_empty() {
        return Err(ApiError::BadRequest("Missing fields".into()));
    }
    if !email.contains('@') {
        return Err(ApiError::BadRequest("Invalid email address".into()));
    }

    // Cheap pre-check; the unique index is still the authority.
    if state.db.find_user_by_email(&email).await?.is_some() {
        return Err(ApiError::Conflict("Email already exists"));
    }

    let password = request.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(ApiError::internal)?
        .map_err(ApiError::internal)?;

    let user = match state.db.create_user(&name, &email, &password_hash).await {
        Ok(user) => user,
        Err(DbError::Duplicate) => return Err(ApiError::Conflict("Email already exists")),
        Err(e) => return Err(e.into()),
    };

    info!(user_id = user.id, "account created");
    respond(&state, &user)
}

pub async fn login<D: Database>(
    State(state): State<AppState<D>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(request) = payload?;
    let email = normalize_email(&request.email);

    if email.is_empty() || request.password.is_empty() {
        return Err(ApiError::BadRequest("Missing fields".into()));
    }

    let user = state.db.find_user_by_email(&email).await?;
    let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
    let password = request.password;
    let valid = tokio::task::spawn_blocking(move || {
        verify_password_or_dummy(&password, stored_hash.as_deref())
    })
    .await
    .map_err(ApiError::internal)?
    .map_err(ApiError::internal)?;

    match user {
        Some(user) if valid => {
            info!(user_id = user.id, "login");
            respond(&state, &user)
        }
        _ => Err(ApiError::Unauthorized(INVALID_CREDENTIALS)),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::db::Database;
    use crate::routes::testing::TestApp;

    #[tokio::test]
    async fn test_signup_returns_user_and_token() {
        let app = TestApp::new();
        let (status, body) = app
            .call(
                Method::POST,
                "/api/signup",
                None,
                Some(json!({"name": " Ana ", "email": " Ana@Example.COM ", "password": "pw"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["name"], "Ana");
        assert_eq!(body["user"]["email"], "ana@example.com");
        assert!(body["user"].get("password_hash").is_none());

        let token = body["token"].as_str().unwrap();
        let claims = app.state.tokens.verify(token).unwrap();
        assert_eq!(claims.user_id().unwrap(), body["user"]["id"].as_i64().unwrap());
    }

    #[tokio::test]
    async fn test_signup_missing_fields() {
        let app = TestApp::new();
        for body in [
            json!({"email": "a@b.com", "password": "pw"}),
            json!({"name": "A", "password": "pw"}),
            json!({"name": "A", "email": "a@b.com"}),
        ] {
            let (status, body) = app.call(Method::POST, "/api/signup", None, Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"], "Missing fields");
        }
    }

    #[tokio::test]
    async fn test_signup_duplicate_email_any_case() {
        let app = TestApp::new();
        let (first_id, _) = app.signup("Ana", "ana@example.com").await;

        let (status, body) = app
            .call(
                Method::POST,
                "/api/signup",
                None,
                Some(json!({"name": "Other", "email": "ANA@example.com", "password": "x"})),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "Email already exists");

        let stored = app
            .state
            .db
            .find_user_by_email("ana@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.id, first_id);
        assert_eq!(stored.name, "Ana");
    }

    #[tokio::test]
    async fn test_login() {
        let app = TestApp::new();
        let (id, _) = app.signup("Ana", "ana@example.com").await;

        let (status, body) = app
            .call(
                Method::POST,
                "/api/login",
                None,
                Some(json!({"email": "ANA@example.com", "password": "correct horse"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["id"], id);
        assert!(body["token"].is_string());
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let app = TestApp::new();
        app.signup("Ana", "ana@example.com").await;

        let wrong_password = app
            .call(
                Method::POST,
                "/api/login",
                None,
                Some(json!({"email": "ana@example.com", "password": "nope"})),
            )
            .await;
        let unknown_email = app
            .call(
                Method::POST,
                "/api/login",
                None,
                Some(json!({"email": "nobody@example.com", "password": "nope"})),
            )
            .await;

        assert_eq!(wrong_password.0, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_password, unknown_email);
        assert_eq!(wrong_password.1, json!({"error": "Invalid credentials"}));
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let app = TestApp::new();
        let request = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/api/login")
            .header("content-type", "application/json")
            .body(axum::body::Body::from("{not json"))
            .unwrap();
        let (status, body) = app.send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }
}
