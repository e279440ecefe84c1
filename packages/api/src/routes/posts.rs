//! Community board: posts, likes and saves.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::auth::AuthUser;
use crate::db::{Database, DeleteOutcome};
use crate::error::ApiError;
use crate::models::{
    Interaction, LikeResponse, LikedPosts, MessageResponse, NewPost, PostInfo, PostPage,
    PostQuery, SaveResponse, SavedPosts, ToggleOutcome, UserPosts,
};
use crate::state::AppState;

pub async fn list_posts<D: Database>(
    State(state): State<AppState<D>>,
    query: Result<Query<PostQuery>, QueryRejection>,
) -> Result<Json<PostPage>, ApiError> {
    let Query(query) = query?;
    let posts = state.db.list_posts(&query).await?;
    Ok(Json(PostPage {
        count: posts.len(),
        posts,
        limit: query.limit(),
        offset: query.offset(),
    }))
}

pub async fn create_post<D: Database>(
    State(state): State<AppState<D>>,
    user: AuthUser,
    payload: Result<Json<NewPost>, JsonRejection>,
) -> Result<(StatusCode, Json<PostInfo>), ApiError> {
    let Json(post) = payload?;
    let post = post.normalized();
    if post.title.is_empty() || post.excerpt.is_empty() {
        return Err(ApiError::BadRequest("Title and excerpt are required".into()));
    }

    let created = state.db.create_post(user.id, &post).await?;
    info!(post_id = created.id, user_id = user.id, "post created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_post<D: Database>(
    State(state): State<AppState<D>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<PostInfo>, ApiError> {
    let Path(id) = id?;
    state
        .db
        .get_post(id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("Post"))
}

pub async fn delete_post<D: Database>(
    State(state): State<AppState<D>>,
    user: AuthUser,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Path(id) = id?;
    match state.db.delete_post(id, user.id).await? {
        DeleteOutcome::Deleted => {
            info!(post_id = id, user_id = user.id, "post deleted");
            Ok(Json(MessageResponse::new("Post deleted")))
        }
        DeleteOutcome::NotFound => Err(ApiError::NotFound("Post")),
        DeleteOutcome::Forbidden => Err(ApiError::Forbidden("Not allowed to delete this post")),
    }
}

async fn toggle<D: Database>(
    state: &AppState<D>,
    interaction: Interaction,
    post_id: i64,
    user_id: i64,
) -> Result<ToggleOutcome, ApiError> {
    let outcome = state
        .db
        .toggle(interaction, post_id, user_id)
        .await?
        .ok_or(ApiError::NotFound("Post"))?;
    tracing::debug!(?interaction, post_id, user_id, active = outcome.active, "toggled");
    Ok(outcome)
}

pub async fn like_post<D: Database>(
    State(state): State<AppState<D>>,
    user: AuthUser,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<LikeResponse>, ApiError> {
    let Path(id) = id?;
    let outcome = toggle(&state, Interaction::Like, id, user.id).await?;
    Ok(Json(outcome.into()))
}

pub async fn save_post<D: Database>(
    State(state): State<AppState<D>>,
    user: AuthUser,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<SaveResponse>, ApiError> {
    let Path(id) = id?;
    let outcome = toggle(&state, Interaction::Save, id, user.id).await?;
    Ok(Json(outcome.into()))
}

pub async fn liked_posts<D: Database>(
    State(state): State<AppState<D>>,
    user: AuthUser,
) -> Result<Json<LikedPosts>, ApiError> {
    let liked_posts = state.db.liked_post_ids(user.id).await?;
    Ok(Json(LikedPosts { liked_posts }))
}

pub async fn saved_posts<D: Database>(
    State(state): State<AppState<D>>,
    user: AuthUser,
) -> Result<Json<SavedPosts>, ApiError> {
    let saved_posts = state.db.saved_posts(user.id).await?;
    Ok(Json(SavedPosts { saved_posts }))
}

pub async fn user_posts<D: Database>(
    State(state): State<AppState<D>>,
    user: AuthUser,
) -> Result<Json<UserPosts>, ApiError> {
    let user_posts = state.db.user_posts(user.id).await?;
    Ok(Json(UserPosts { user_posts }))
}
