//! # Community board cache
//!
//! The device keeps the posts its user wrote plus the ids of posts they liked and
//! saved, so the board renders before (or without) a network round-trip.
//!
//! | Key | Value |
//! |-----|-------|
//! | `communityPosts` | JSON array of [`PostInfo`], newest first |
//! | `userLikes` | JSON array of post ids |
//! | `userSaves` | JSON array of post ids |
//!
//! Toggles follow the server contract: a post id is either in the set or not, and a
//! second toggle restores the previous state. [`CommunityCache::view`] merges cached
//! and fetched posts and applies the board's `All | Liked | Saved` filter.

use std::collections::HashSet;
use std::sync::Arc;

use api::models::{Interaction, PostInfo};
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::kv::{get_list, set_json, KeyValueStore};

pub const POSTS_KEY: &str = "communityPosts";
pub const LIKES_KEY: &str = "userLikes";
pub const SAVES_KEY: &str = "userSaves";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CommunityFilter {
    #[default]
    All,
    Liked,
    Saved,
}

#[derive(Clone, Debug)]
pub struct CommunityCache<S> {
    store: S,
    /// Serialises read-modify-write updates made through this handle and its clones.
    writes: Arc<Mutex<()>>,
}

fn key_for(interaction: Interaction) -> &'static str {
    match interaction {
        Interaction::Like => LIKES_KEY,
        Interaction::Save => SAVES_KEY,
    }
}

impl<S: KeyValueStore> CommunityCache<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            writes: Arc::new(Mutex::new(())),
        }
    }

    /// Posts written on this device, newest first.
    pub async fn posts(&self) -> Result<Vec<PostInfo>, StoreError> {
        get_list(&self.store, POSTS_KEY).await
    }

    pub async fn add_post(&self, post: PostInfo) -> Result<(), StoreError> {
        let _guard = self.writes.lock().await;
        let mut posts = self.posts().await?;
        posts.retain(|p| p.id != post.id);
        posts.insert(0, post);
        set_json(&self.store, POSTS_KEY, &posts).await
    }

    /// Forget a post and any like or save of it.
    pub async fn remove_post(&self, id: i64) -> Result<(), StoreError> {
        let _guard = self.writes.lock().await;
        let mut posts = self.posts().await?;
        posts.retain(|p| p.id != id);
        set_json(&self.store, POSTS_KEY, &posts).await?;
        for interaction in [Interaction::Like, Interaction::Save] {
            self.write_membership(interaction, id, false).await?;
        }
        Ok(())
    }

    pub async fn ids(&self, interaction: Interaction) -> Result<Vec<i64>, StoreError> {
        get_list(&self.store, key_for(interaction)).await
    }

    /// Replace the set, e.g. with the server's `likedPosts`.
    pub async fn set_ids(&self, interaction: Interaction, ids: &[i64]) -> Result<(), StoreError> {
        let mut seen = HashSet::new();
        let unique: Vec<i64> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();
        let _guard = self.writes.lock().await;
        set_json(&self.store, key_for(interaction), &unique).await
    }

    /// Set membership of `post_id` explicitly, e.g. from a toggle response.
    pub async fn record(
        &self,
        interaction: Interaction,
        post_id: i64,
        active: bool,
    ) -> Result<(), StoreError> {
        let _guard = self.writes.lock().await;
        self.write_membership(interaction, post_id, active).await
    }

    /// Flip membership of `post_id`; returns whether it is now in the set.
    pub async fn toggle(&self, interaction: Interaction, post_id: i64) -> Result<bool, StoreError> {
        let _guard = self.writes.lock().await;
        let active = !self.ids(interaction).await?.contains(&post_id);
        self.write_membership(interaction, post_id, active).await?;
        Ok(active)
    }

    /// Callers hold `writes`.
    async fn write_membership(
        &self,
        interaction: Interaction,
        post_id: i64,
        active: bool,
    ) -> Result<(), StoreError> {
        let mut ids = self.ids(interaction).await?;
        let present = ids.contains(&post_id);
        match (present, active) {
            (false, true) => ids.push(post_id),
            (true, false) => ids.retain(|id| *id != post_id),
            _ => return Ok(()),
        }
        set_json(&self.store, key_for(interaction), &ids).await
    }

    /// Cached and `fetched` posts merged by id (fetched wins), newest first, filtered.
    pub async fn view(
        &self,
        fetched: &[PostInfo],
        filter: CommunityFilter,
    ) -> Result<Vec<PostInfo>, StoreError> {
        let wanted: Option<HashSet<i64>> = match filter {
            CommunityFilter::All => None,
            CommunityFilter::Liked => Some(self.ids(Interaction::Like).await?.into_iter().collect()),
            CommunityFilter::Saved => Some(self.ids(Interaction::Save).await?.into_iter().collect()),
        };

        let mut seen = HashSet::new();
        let mut merged: Vec<PostInfo> = fetched
            .iter()
            .cloned()
            .chain(self.posts().await?)
            .filter(|post| seen.insert(post.id))
            .filter(|post| wanted.as_ref().map_or(true, |ids| ids.contains(&post.id)))
            .collect();
        merged.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::MemoryStore;

    fn post(id: i64, day: u32, title: &str) -> PostInfo {
        let at = Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap();
        PostInfo {
            id,
            user_id: 1,
            title: title.into(),
            excerpt: "excerpt".into(),
            tags: None,
            likes_count: 0,
            saves_count: 0,
            created_at: at,
            updated_at: at,
            author: None,
            author_email: None,
        }
    }

    #[tokio::test]
    async fn test_toggle_twice_restores() {
        let cache = CommunityCache::new(MemoryStore::new());
        assert!(cache.toggle(Interaction::Like, 5).await.unwrap());
        assert_eq!(cache.ids(Interaction::Like).await.unwrap(), vec![5]);
        assert!(cache.ids(Interaction::Save).await.unwrap().is_empty());

        assert!(!cache.toggle(Interaction::Like, 5).await.unwrap());
        assert!(cache.ids(Interaction::Like).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_record_is_idempotent() {
        let cache = CommunityCache::new(MemoryStore::new());
        cache.record(Interaction::Save, 3, true).await.unwrap();
        cache.record(Interaction::Save, 3, true).await.unwrap();
        assert_eq!(cache.ids(Interaction::Save).await.unwrap(), vec![3]);

        cache.set_ids(Interaction::Save, &[4, 4, 9]).await.unwrap();
        assert_eq!(cache.ids(Interaction::Save).await.unwrap(), vec![4, 9]);
    }

    #[tokio::test]
    async fn test_view_merges_and_filters() {
        let cache = CommunityCache::new(MemoryStore::new());
        cache.add_post(post(1, 1, "local old")).await.unwrap();
        cache.add_post(post(3, 3, "local new")).await.unwrap();
        assert_eq!(cache.posts().await.unwrap()[0].id, 3);

        let fetched = vec![post(2, 2, "remote"), post(3, 3, "remote copy")];
        let all = cache.view(&fetched, CommunityFilter::All).await.unwrap();
        let ids: Vec<i64> = all.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        assert_eq!(all[0].title, "remote copy");

        cache.toggle(Interaction::Like, 2).await.unwrap();
        cache.toggle(Interaction::Save, 1).await.unwrap();
        let liked = cache.view(&fetched, CommunityFilter::Liked).await.unwrap();
        assert_eq!(liked.iter().map(|p| p.id).collect::<Vec<_>>(), vec![2]);
        let saved = cache.view(&fetched, CommunityFilter::Saved).await.unwrap();
        assert_eq!(saved.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1]);
    }

    #[tokio::test]
    async fn test_remove_post_forgets_interactions() {
        let cache = CommunityCache::new(MemoryStore::new());
        cache.add_post(post(1, 1, "mine")).await.unwrap();
        cache.toggle(Interaction::Like, 1).await.unwrap();
        cache.toggle(Interaction::Save, 1).await.unwrap();

        cache.remove_post(1).await.unwrap();
        assert!(cache.posts().await.unwrap().is_empty());
        assert!(cache.ids(Interaction::Like).await.unwrap().is_empty());
        assert!(cache.ids(Interaction::Save).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_toggles_are_not_lost() {
        let cache = CommunityCache::new(MemoryStore::new());
        let mut handles = Vec::new();
        for id in 0..20 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                cache.toggle(Interaction::Like, id).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        let mut ids = cache.ids(Interaction::Like).await.unwrap();
        ids.sort_unstable();
        assert_eq!(ids, (0..20).collect::<Vec<i64>>());
    }
}
