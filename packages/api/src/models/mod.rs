//! Data models for the application.

mod post;
mod user;

#[cfg(feature = "server")]
pub use post::PostRow;
pub use post::{
    Interaction, LikeResponse, LikedPosts, NewPost, PostInfo, PostPage, PostQuery, SaveResponse,
    SavedPosts, ToggleOutcome, UserPosts, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
#[cfg(feature = "server")]
pub use user::User;
pub use user::{normalize_email, UserInfo};

use serde::{Deserialize, Serialize};

/// Body of `POST /api/signup`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Body of `POST /api/login`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Successful signup or login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthResponse {
    pub user: UserInfo,
    pub token: String,
}

/// Body of `PUT /api/user/profile`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub name: String,
}

/// Response of `GET /api/survey`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SurveyResponse {
    pub data: Option<serde_json::Value>,
}

/// Acknowledgement of `POST /api/survey`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SurveySaved {
    pub ok: bool,
}

/// Plain `{message}` acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
