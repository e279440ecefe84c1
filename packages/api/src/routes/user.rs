//! Profile of the authenticated user, including the profile photo.

use axum::{
    body::Bytes,
    extract::multipart::{Multipart, MultipartError, MultipartRejection},
    extract::rejection::JsonRejection,
    extract::State,
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::auth::AuthUser;
use crate::db::Database;
use crate::error::ApiError;
use crate::models::{ProfileUpdate, UserInfo};
use crate::state::AppState;
use crate::upload;

/// Multipart field carrying the photo.
const PHOTO_FIELD: &str = "photo";

pub async fn get_profile<D: Database>(
    State(state): State<AppState<D>>,
    user: AuthUser,
) -> Result<Json<UserInfo>, ApiError> {
    let user = state
        .db
        .find_user(user.id)
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    Ok(Json(user.to_info()))
}

pub async fn update_profile<D: Database>(
    State(state): State<AppState<D>>,
    user: AuthUser,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<UserInfo>, ApiError> {
    let Json(update) = payload?;
    let name = update.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Name is required".into()));
    }

    let user = state
        .db
        .update_user_name(user.id, name)
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    Ok(Json(user.to_info()))
}

fn multipart_error(error: MultipartError) -> ApiError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::BadRequest("File too large".into())
    } else {
        ApiError::BadRequest(error.body_text())
    }
}

/// First `photo` field of the form, with its declared content type.
async fn read_photo(multipart: &mut Multipart) -> Result<Option<(String, Bytes)>, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(PHOTO_FIELD) {
            continue;
        }
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        return Ok(Some((content_type, bytes)));
    }
    Ok(None)
}

pub async fn upload_photo<D: Database>(
    State(state): State<AppState<D>>,
    user: AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UserInfo>, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let (content_type, bytes) = read_photo(&mut multipart)
        .await?
        .ok_or_else(|| ApiError::BadRequest("No file uploaded".into()))?;

    let extension = upload::validate(&state.uploads, &content_type, bytes.len())?;
    let url = upload::save_photo(&state.uploads, user.id, extension, &bytes).await?;

    let change = match state.db.set_profile_photo(user.id, Some(&url)).await {
        Ok(Some(change)) => change,
        Ok(None) => {
            upload::remove_photo(&state.uploads, &url).await;
            return Err(ApiError::NotFound("User"));
        }
        Err(e) => {
            upload::remove_photo(&state.uploads, &url).await;
            return Err(e.into());
        }
    };
    if let Some(previous) = change.previous.as_deref() {
        upload::remove_photo(&state.uploads, previous).await;
    }

    info!(user_id = user.id, size = bytes.len(), "profile photo updated");
    Ok(Json(change.user.to_info()))
}

pub async fn delete_photo<D: Database>(
    State(state): State<AppState<D>>,
    user: AuthUser,
) -> Result<Json<UserInfo>, ApiError> {
    let change = state
        .db
        .set_profile_photo(user.id, None)
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    if let Some(previous) = change.previous.as_deref() {
        upload::remove_photo(&state.uploads, previous).await;
    }
    Ok(Json(change.user.to_info()))
}
