//! PostgreSQL implementation of [`Database`].

use serde_json::Value;
use sqlx::{types::Json, PgPool};

use super::{Database, DbError, DeleteOutcome, PhotoChange};
use crate::models::{Interaction, NewPost, PostInfo, PostQuery, PostRow, ToggleOutcome, User};

const POST_COLUMNS: &str = "p.id, p.user_id, p.title, p.excerpt, p.tags, p.likes_count, \
                            p.saves_count, p.created_at, p.updated_at";

/// Database backed by a `sqlx` Postgres pool.
#[derive(Clone, Debug)]
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// `%needle%` for ILIKE, with the pattern metacharacters escaped.
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn into_infos(rows: Vec<PostRow>) -> Vec<PostInfo> {
    rows.into_iter().map(PostRow::into_info).collect()
}

impl Database for PgDatabase {
    async fn ping(&self) -> Result<(), DbError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, DbError> {
        let user = sqlx::query_as(
            "INSERT INTO users (name, email, password_hash) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        let user = sqlx::query_as("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, DbError> {
        let user = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn update_user_name(&self, id: i64, name: &str) -> Result<Option<User>, DbError> {
        let user = sqlx::query_as("UPDATE users SET name = $1 WHERE id = $2 RETURNING *")
            .bind(name)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn set_profile_photo(
        &self,
        id: i64,
        photo: Option<&str>,
    ) -> Result<Option<PhotoChange>, DbError> {
        let mut tx = self.pool.begin().await?;

        let previous: Option<(Option<String>,)> =
            sqlx::query_as("SELECT profile_photo FROM users WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((previous,)) = previous else {
            return Ok(None);
        };

        let user: User =
            sqlx::query_as("UPDATE users SET profile_photo = $1 WHERE id = $2 RETURNING *")
                .bind(photo)
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        tx.commit().await?;
        Ok(Some(PhotoChange { user, previous }))
    }

    async fn upsert_survey(&self, user_id: i64, data: &Value) -> Result<(), DbError> {
        sqlx::query(
            "INSERT INTO user_profiles (user_id, data, updated_at)
             VALUES ($1, $2, NOW())
             ON CONFLICT (user_id)
             DO UPDATE SET data = EXCLUDED.data, updated_at = NOW()",
        )
        .bind(user_id)
        .bind(Json(data))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_survey(&self, user_id: i64) -> Result<Option<Value>, DbError> {
        let row: Option<(Value,)> =
            sqlx::query_as("SELECT data FROM user_profiles WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(data,)| data))
    }

    async fn create_post(&self, user_id: i64, post: &NewPost) -> Result<PostInfo, DbError> {
        let row: PostRow = sqlx::query_as(
            "INSERT INTO posts (user_id, title, excerpt, tags, created_at, updated_at)
             VALUES ($1, $2, $3, $4, NOW(), NOW())
             RETURNING id, user_id, title, excerpt, tags, likes_count, saves_count,
                       created_at, updated_at",
        )
        .bind(user_id)
        .bind(&post.title)
        .bind(&post.excerpt)
        .bind(post.tags.clone().map(Json))
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into_info())
    }

    async fn list_posts(&self, query: &PostQuery) -> Result<Vec<PostInfo>, DbError> {
        let sql = format!(
            "SELECT {POST_COLUMNS}, u.name AS author
             FROM posts p
             JOIN users u ON p.user_id = u.id
             WHERE $1::text IS NULL OR EXISTS (
                 SELECT 1 FROM jsonb_array_elements_text(COALESCE(p.tags, '[]'::jsonb)) AS t(tag)
                 WHERE t.tag ILIKE $1
             )
             ORDER BY p.created_at DESC, p.id DESC
             LIMIT $2 OFFSET $3"
        );
        let rows: Vec<PostRow> = sqlx::query_as(&sql)
            .bind(query.tag().map(like_pattern))
            .bind(query.limit())
            .bind(query.offset())
            .fetch_all(&self.pool)
            .await?;
        Ok(into_infos(rows))
    }

    async fn get_post(&self, id: i64) -> Result<Option<PostInfo>, DbError> {
        let sql = format!(
            "SELECT {POST_COLUMNS}, u.name AS author, u.email AS author_email
             FROM posts p
             JOIN users u ON p.user_id = u.id
             WHERE p.id = $1"
        );
        let row: Option<PostRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(PostRow::into_info))
    }

    async fn delete_post(&self, id: i64, user_id: i64) -> Result<DeleteOutcome, DbError> {
        let mut tx = self.pool.begin().await?;

        let owner: Option<(i64,)> =
            sqlx::query_as("SELECT user_id FROM posts WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        match owner {
            None => return Ok(DeleteOutcome::NotFound),
            Some((owner,)) if owner != user_id => return Ok(DeleteOutcome::Forbidden),
            Some(_) => {}
        }

        for interaction in [Interaction::Like, Interaction::Save] {
            let sql = format!("DELETE FROM {} WHERE post_id = $1", interaction.table());
            sqlx::query(&sql).bind(id).execute(&mut *tx).await?;
        }
        sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(DeleteOutcome::Deleted)
    }

    async fn toggle(
        &self,
        interaction: Interaction,
        post_id: i64,
        user_id: i64,
    ) -> Result<Option<ToggleOutcome>, DbError> {
        let table = interaction.table();
        let column = interaction.counter_column();
        let mut tx = self.pool.begin().await?;

        // Row lock serialises toggles on the same post.
        let post: Option<(i64,)> = sqlx::query_as("SELECT id FROM posts WHERE id = $1 FOR UPDATE")
            .bind(post_id)
            .fetch_optional(&mut *tx)
            .await?;
        if post.is_none() {
            return Ok(None);
        }

        let delete = format!("DELETE FROM {table} WHERE post_id = $1 AND user_id = $2");
        let removed = sqlx::query(&delete)
            .bind(post_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        if !removed {
            let insert = format!(
                "INSERT INTO {table} (post_id, user_id, created_at) VALUES ($1, $2, NOW())
                 ON CONFLICT (post_id, user_id) DO NOTHING"
            );
            sqlx::query(&insert)
                .bind(post_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        let recount = format!(
            "UPDATE posts SET {column} = (SELECT COUNT(*) FROM {table} WHERE post_id = $1)
             WHERE id = $1
             RETURNING {column}"
        );
        let (count,): (i64,) = sqlx::query_as(&recount)
            .bind(post_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(ToggleOutcome {
            active: !removed,
            count,
        }))
    }

    async fn liked_post_ids(&self, user_id: i64) -> Result<Vec<i64>, DbError> {
        let rows: Vec<(i64,)> = sqlx::query_as(
            "SELECT post_id FROM post_likes WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn saved_posts(&self, user_id: i64) -> Result<Vec<PostInfo>, DbError> {
        let sql = format!(
            "SELECT {POST_COLUMNS}, u.name AS author
             FROM post_saves ps
             JOIN posts p ON ps.post_id = p.id
             JOIN users u ON p.user_id = u.id
             WHERE ps.user_id = $1
             ORDER BY ps.created_at DESC, ps.id DESC"
        );
        let rows: Vec<PostRow> = sqlx::query_as(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(into_infos(rows))
    }

    async fn user_posts(&self, user_id: i64) -> Result<Vec<PostInfo>, DbError> {
        let sql = format!(
            "SELECT {POST_COLUMNS}
             FROM posts p
             WHERE p.user_id = $1
             ORDER BY p.created_at DESC, p.id DESC"
        );
        let rows: Vec<PostRow> = sqlx::query_as(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(into_infos(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The `sqlx::test` cases need a PostgreSQL server: run them with
    // `DATABASE_URL=postgres://... cargo test -p api -- --ignored`.
    // Each one gets a fresh database with the migrations applied.

    async fn seed_users(db: &PgDatabase, count: usize) -> Vec<i64> {
        let mut ids = Vec::with_capacity(count);
        for i in 0..count {
            let user = db
                .create_user(&format!("user{i}"), &format!("user{i}@example.com"), "hash")
                .await
                .unwrap();
            ids.push(user.id);
        }
        ids
    }

    async fn seed_post(db: &PgDatabase, owner: i64, title: &str, tags: &[&str]) -> i64 {
        let post = NewPost {
            title: title.into(),
            excerpt: "excerpt".into(),
            tags: Some(tags.iter().map(|t| t.to_string()).collect()),
        };
        db.create_post(owner, &post).await.unwrap().id
    }

    async fn join_rows(pool: &PgPool, interaction: Interaction, post_id: i64) -> i64 {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE post_id = $1", interaction.table());
        let (count,): (i64,) = sqlx::query_as(&sql)
            .bind(post_id)
            .fetch_one(pool)
            .await
            .unwrap();
        count
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL"]
    async fn test_double_toggle_restores_state(pool: PgPool) {
        let db = PgDatabase::new(pool.clone());
        let users = seed_users(&db, 2).await;
        let post_id = seed_post(&db, users[0], "First nap", &[]).await;

        let liked = db.toggle(Interaction::Like, post_id, users[1]).await.unwrap();
        assert_eq!(liked, Some(ToggleOutcome { active: true, count: 1 }));
        assert_eq!(db.liked_post_ids(users[1]).await.unwrap(), vec![post_id]);

        let unliked = db.toggle(Interaction::Like, post_id, users[1]).await.unwrap();
        assert_eq!(unliked, Some(ToggleOutcome { active: false, count: 0 }));
        assert!(db.liked_post_ids(users[1]).await.unwrap().is_empty());
        assert_eq!(join_rows(&pool, Interaction::Like, post_id).await, 0);

        assert_eq!(db.toggle(Interaction::Save, post_id + 1000, users[1]).await.unwrap(), None);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL"]
    async fn test_concurrent_toggles_keep_counter_in_sync(pool: PgPool) {
        let db = PgDatabase::new(pool.clone());
        let users = seed_users(&db, 8).await;
        let post_id = seed_post(&db, users[0], "Busy post", &[]).await;

        let mut handles = Vec::new();
        for &user in &users {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                db.toggle(Interaction::Like, post_id, user).await.unwrap()
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().is_some_and(|outcome| outcome.active));
        }

        let post = db.get_post(post_id).await.unwrap().unwrap();
        assert_eq!(post.likes_count, users.len() as i64);
        assert_eq!(join_rows(&pool, Interaction::Like, post_id).await, post.likes_count);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL"]
    async fn test_delete_removes_memberships(pool: PgPool) {
        let db = PgDatabase::new(pool.clone());
        let users = seed_users(&db, 2).await;
        let post_id = seed_post(&db, users[0], "Mine", &[]).await;
        db.toggle(Interaction::Like, post_id, users[1]).await.unwrap();
        db.toggle(Interaction::Save, post_id, users[1]).await.unwrap();

        assert_eq!(db.delete_post(post_id, users[1]).await.unwrap(), DeleteOutcome::Forbidden);
        assert_eq!(join_rows(&pool, Interaction::Like, post_id).await, 1);

        assert_eq!(db.delete_post(post_id, users[0]).await.unwrap(), DeleteOutcome::Deleted);
        assert_eq!(join_rows(&pool, Interaction::Like, post_id).await, 0);
        assert_eq!(join_rows(&pool, Interaction::Save, post_id).await, 0);
        assert!(db.get_post(post_id).await.unwrap().is_none());
        assert!(db.saved_posts(users[1]).await.unwrap().is_empty());
        assert_eq!(db.delete_post(post_id, users[0]).await.unwrap(), DeleteOutcome::NotFound);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL"]
    async fn test_tag_filter_is_case_insensitive_substring(pool: PgPool) {
        let db = PgDatabase::new(pool);
        let users = seed_users(&db, 1).await;
        let sleep = seed_post(&db, users[0], "Sleep", &["Sleep Training"]).await;
        seed_post(&db, users[0], "Food", &["feeding"]).await;
        seed_post(&db, users[0], "Untagged", &[]).await;
        seed_post(&db, users[0], "Literal", &["100% tired"]).await;

        let by_tag = |tag: &str| PostQuery {
            tag: Some(tag.into()),
            ..PostQuery::default()
        };

        let found = db.list_posts(&by_tag("sLEEP")).await.unwrap();
        assert_eq!(found.iter().map(|p| p.id).collect::<Vec<_>>(), vec![sleep]);
        assert_eq!(found[0].author.as_deref(), Some("user0"));

        assert!(db.list_posts(&by_tag("nap")).await.unwrap().is_empty());
        // `%` is matched literally.
        assert_eq!(db.list_posts(&by_tag("0%")).await.unwrap().len(), 1);
        assert_eq!(db.list_posts(&PostQuery::default()).await.unwrap().len(), 4);
    }

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("sleep"), "%sleep%");
        assert_eq!(like_pattern("100%_a\\b"), "%100\\%\\_a\\\\b%");
    }
}
