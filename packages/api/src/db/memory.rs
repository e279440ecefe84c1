use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{Database, DbError, DeleteOutcome, PhotoChange};
use crate::models::{Interaction, NewPost, PostInfo, PostQuery, ToggleOutcome, User};

/// In-memory Database for tests and the `memory` demo mode.
#[derive(Clone, Debug, Default)]
pub struct MemoryDatabase {
    tables: Arc<Mutex<Tables>>,
}

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    profiles: HashMap<i64, Value>,
    posts: BTreeMap<i64, StoredPost>,
    /// (post, user) -> insertion sequence
    likes: BTreeMap<(i64, i64), u64>,
    saves: BTreeMap<(i64, i64), u64>,
    next_id: i64,
    sequence: u64,
}

#[derive(Debug, Clone)]
struct StoredPost {
    id: i64,
    user_id: i64,
    title: String,
    excerpt: String,
    tags: Option<Vec<String>>,
    likes_count: i64,
    saves_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    fn memberships(&mut self, interaction: Interaction) -> &mut BTreeMap<(i64, i64), u64> {
        match interaction {
            Interaction::Like => &mut self.likes,
            Interaction::Save => &mut self.saves,
        }
    }

    fn info(&self, post: &StoredPost, with_email: bool) -> PostInfo {
        let author = self.users.get(&post.user_id);
        PostInfo {
            id: post.id,
            user_id: post.user_id,
            title: post.title.clone(),
            excerpt: post.excerpt.clone(),
            tags: post.tags.clone(),
            likes_count: post.likes_count,
            saves_count: post.saves_count,
            created_at: post.created_at,
            updated_at: post.updated_at,
            author: author.map(|u| u.name.clone()),
            author_email: author.filter(|_| with_email).map(|u| u.email.clone()),
        }
    }

    /// Posts newest first, as in `ORDER BY created_at DESC, id DESC`.
    fn newest_first(&self) -> Vec<&StoredPost> {
        let mut posts: Vec<&StoredPost> = self.posts.values().collect();
        posts.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        posts
    }
}

impl Database for MemoryDatabase {
    async fn ping(&self) -> Result<(), DbError> {
        Ok(())
    }

    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, DbError> {
        let mut tables = self.tables();
        if tables.users.values().any(|u| u.email == email) {
            return Err(DbError::Duplicate);
        }
        let user = User {
            id: tables.next_id(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            profile_photo: None,
            created_at: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        let tables = self.tables();
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, DbError> {
        Ok(self.tables().users.get(&id).cloned())
    }

    async fn update_user_name(&self, id: i64, name: &str) -> Result<Option<User>, DbError> {
        let mut tables = self.tables();
        Ok(tables.users.get_mut(&id).map(|user| {
            user.name = name.to_string();
            user.clone()
        }))
    }

    async fn set_profile_photo(
        &self,
        id: i64,
        photo: Option<&str>,
    ) -> Result<Option<PhotoChange>, DbError> {
        let mut tables = self.tables();
        Ok(tables.users.get_mut(&id).map(|user| {
            let previous = std::mem::replace(&mut user.profile_photo, photo.map(str::to_string));
            PhotoChange {
                user: user.clone(),
                previous,
            }
        }))
    }

    async fn upsert_survey(&self, user_id: i64, data: &Value) -> Result<(), DbError> {
        self.tables().profiles.insert(user_id, data.clone());
        Ok(())
    }

    async fn get_survey(&self, user_id: i64) -> Result<Option<Value>, DbError> {
        Ok(self.tables().profiles.get(&user_id).cloned())
    }

    async fn create_post(&self, user_id: i64, post: &NewPost) -> Result<PostInfo, DbError> {
        let mut tables = self.tables();
        let now = Utc::now();
        let stored = StoredPost {
            id: tables.next_id(),
            user_id,
            title: post.title.clone(),
            excerpt: post.excerpt.clone(),
            tags: post.tags.clone(),
            likes_count: 0,
            saves_count: 0,
            created_at: now,
            updated_at: now,
        };
        let mut info = tables.info(&stored, false);
        info.author = None;
        tables.posts.insert(stored.id, stored);
        Ok(info)
    }

    async fn list_posts(&self, query: &PostQuery) -> Result<Vec<PostInfo>, DbError> {
        let tables = self.tables();
        let posts = tables
            .newest_first()
            .into_iter()
            .map(|post| tables.info(post, false))
            .filter(|info| query.tag().map_or(true, |tag| info.matches_tag(tag)))
            .skip(query.offset() as usize)
            .take(query.limit() as usize)
            .collect();
        Ok(posts)
    }

    async fn get_post(&self, id: i64) -> Result<Option<PostInfo>, DbError> {
        let tables = self.tables();
        Ok(tables.posts.get(&id).map(|post| tables.info(post, true)))
    }

    async fn delete_post(&self, id: i64, user_id: i64) -> Result<DeleteOutcome, DbError> {
        let mut tables = self.tables();
        match tables.posts.get(&id) {
            None => return Ok(DeleteOutcome::NotFound),
            Some(post) if post.user_id != user_id => return Ok(DeleteOutcome::Forbidden),
            Some(_) => {}
        }
        tables.likes.retain(|(post_id, _), _| *post_id != id);
        tables.saves.retain(|(post_id, _), _| *post_id != id);
        tables.posts.remove(&id);
        Ok(DeleteOutcome::Deleted)
    }

    async fn toggle(
        &self,
        interaction: Interaction,
        post_id: i64,
        user_id: i64,
    ) -> Result<Option<ToggleOutcome>, DbError> {
        let mut tables = self.tables();
        if !tables.posts.contains_key(&post_id) {
            return Ok(None);
        }

        let sequence = tables.next_sequence();
        let members = tables.memberships(interaction);
        let active = members.remove(&(post_id, user_id)).is_none();
        if active {
            members.insert((post_id, user_id), sequence);
        }
        let count = members.keys().filter(|(post, _)| *post == post_id).count() as i64;

        if let Some(post) = tables.posts.get_mut(&post_id) {
            match interaction {
                Interaction::Like => post.likes_count = count,
                Interaction::Save => post.saves_count = count,
            }
        }
        Ok(Some(ToggleOutcome { active, count }))
    }

    async fn liked_post_ids(&self, user_id: i64) -> Result<Vec<i64>, DbError> {
        let tables = self.tables();
        let mut liked: Vec<(u64, i64)> = tables
            .likes
            .iter()
            .filter(|((_, user), _)| *user == user_id)
            .map(|((post, _), sequence)| (*sequence, *post))
            .collect();
        liked.sort_by(|a, b| b.cmp(a));
        Ok(liked.into_iter().map(|(_, post)| post).collect())
    }

    async fn saved_posts(&self, user_id: i64) -> Result<Vec<PostInfo>, DbError> {
        let tables = self.tables();
        let mut saved: Vec<(u64, i64)> = tables
            .saves
            .iter()
            .filter(|((_, user), _)| *user == user_id)
            .map(|((post, _), sequence)| (*sequence, *post))
            .collect();
        saved.sort_by(|a, b| b.cmp(a));
        Ok(saved
            .into_iter()
            .filter_map(|(_, post)| tables.posts.get(&post))
            .map(|post| tables.info(post, false))
            .collect())
    }

    async fn user_posts(&self, user_id: i64) -> Result<Vec<PostInfo>, DbError> {
        let tables = self.tables();
        Ok(tables
            .newest_first()
            .into_iter()
            .filter(|post| post.user_id == user_id)
            .map(|post| {
                let mut info = tables.info(post, false);
                info.author = None;
                info
            })
            .collect())
    }
}
