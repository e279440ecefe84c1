//! Community board models: posts, queries and like/save interactions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "server")]
use sqlx::{types::Json, FromRow};

/// Default page size for `GET /api/posts`.
pub const DEFAULT_PAGE_SIZE: i64 = 20;
/// Upper bound for a requested page size.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Post row as stored in `posts`, optionally joined with its author.
#[cfg(feature = "server")]
#[derive(Debug, Clone, FromRow)]
pub struct PostRow {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub excerpt: String,
    pub tags: Option<Json<Vec<String>>>,
    pub likes_count: i64,
    pub saves_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(default)]
    pub author: Option<String>,
    #[sqlx(default)]
    pub author_email: Option<String>,
}

#[cfg(feature = "server")]
impl PostRow {
    /// Convert to PostInfo for client consumption.
    pub fn into_info(self) -> PostInfo {
        PostInfo {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            excerpt: self.excerpt,
            tags: self.tags.map(|Json(tags)| tags),
            likes_count: self.likes_count,
            saves_count: self.saves_count,
            created_at: self.created_at,
            updated_at: self.updated_at,
            author: self.author,
            author_email: self.author_email,
        }
    }
}

/// A post as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostInfo {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub excerpt: String,
    pub tags: Option<Vec<String>>,
    pub likes_count: i64,
    pub saves_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_email: Option<String>,
}

impl PostInfo {
    /// Whether any tag contains `needle`, ignoring case.
    pub fn matches_tag(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.tags
            .iter()
            .flatten()
            .any(|tag| tag.to_lowercase().contains(&needle))
    }
}

/// Body of `POST /api/posts`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewPost {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl NewPost {
    /// Trim title and excerpt and drop blank tags.
    pub fn normalized(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            excerpt: self.excerpt.trim().to_string(),
            tags: self.tags.map(|tags| {
                tags.into_iter()
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect()
            }),
        }
    }
}

/// Query string of `GET /api/posts`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PostQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub tag: Option<String>,
}

impl PostQuery {
    /// Effective page size, clamped to `1..=MAX_PAGE_SIZE`.
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    /// Effective offset, never negative.
    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    /// Tag filter, ignoring blank values.
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

/// Response of `GET /api/posts`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostPage {
    pub posts: Vec<PostInfo>,
    pub count: usize,
    pub limit: i64,
    pub offset: i64,
}

/// A membership a user can toggle on a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interaction {
    Like,
    Save,
}

impl Interaction {
    /// Join table holding the (post, user) pairs.
    pub fn table(self) -> &'static str {
        match self {
            Interaction::Like => "post_likes",
            Interaction::Save => "post_saves",
        }
    }

    /// Denormalized counter column on `posts`.
    pub fn counter_column(self) -> &'static str {
        match self {
            Interaction::Like => "likes_count",
            Interaction::Save => "saves_count",
        }
    }
}

/// State of an interaction after a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleOutcome {
    /// Whether the pair exists after the toggle.
    pub active: bool,
    /// Counter value after the toggle.
    pub count: i64,
}

/// Response of `POST /api/posts/{id}/like`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LikeResponse {
    pub liked: bool,
    pub likes_count: i64,
    pub message: String,
}

/// Response of `POST /api/posts/{id}/save`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SaveResponse {
    pub saved: bool,
    pub saves_count: i64,
    pub message: String,
}

impl From<ToggleOutcome> for LikeResponse {
    fn from(outcome: ToggleOutcome) -> Self {
        Self {
            liked: outcome.active,
            likes_count: outcome.count,
            message: if outcome.active { "Post liked" } else { "Post unliked" }.to_string(),
        }
    }
}

impl From<ToggleOutcome> for SaveResponse {
    fn from(outcome: ToggleOutcome) -> Self {
        Self {
            saved: outcome.active,
            saves_count: outcome.count,
            message: if outcome.active {
                "Post saved"
            } else {
                "Post removed from saves"
            }
            .to_string(),
        }
    }
}

/// Response of `GET /api/user/likes`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LikedPosts {
    #[serde(rename = "likedPosts")]
    pub liked_posts: Vec<i64>,
}

/// Response of `GET /api/user/saves`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SavedPosts {
    #[serde(rename = "savedPosts")]
    pub saved_posts: Vec<PostInfo>,
}

/// Response of `GET /api/user/posts`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserPosts {
    #[serde(rename = "userPosts")]
    pub user_posts: Vec<PostInfo>,
}
