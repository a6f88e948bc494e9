use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use super::{PostFilter, PostStore};
use crate::domain::{
    Account, AuthorSummary, Gender, NewPost, Post, PostView, PostWithAuthor, RelationType,
};

const POST_WITH_AUTHOR_COLUMNS: &str = r#"
    p.id, p.user_id, p.description, p.image, p.creation_date, p.exposure_date,
    p.removed, p.hidden, p.campaign, p.gender_filter, p.age_filter_low, p.age_filter_high,
    a.username AS author_username, a.gender AS author_gender,
    a.birth_date AS author_birth_date, a.banned AS author_banned,
    a.private AS author_private
"#;

#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    user_id: Uuid,
    description: String,
    image: String,
    creation_date: DateTime<Utc>,
    exposure_date: DateTime<Utc>,
    removed: bool,
    hidden: bool,
    campaign: bool,
    gender_filter: i16,
    age_filter_low: i32,
    age_filter_high: i32,
}

impl PostRow {
    fn into_post(self, tags: Vec<AuthorSummary>) -> Result<Post> {
        Ok(Post {
            id: self.id,
            user_id: self.user_id,
            description: self.description,
            image: self.image,
            creation_date: self.creation_date,
            exposure_date: self.exposure_date,
            removed: self.removed,
            hidden: self.hidden,
            campaign: self.campaign,
            gender_filter: Gender::try_from(self.gender_filter)?,
            age_filter_low: self.age_filter_low,
            age_filter_high: self.age_filter_high,
            tags,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PostAuthorRow {
    #[sqlx(flatten)]
    post: PostRow,
    author_username: String,
    author_gender: i16,
    author_birth_date: DateTime<Utc>,
    author_banned: bool,
    author_private: bool,
}

impl PostAuthorRow {
    fn into_domain(self, tags: Vec<AuthorSummary>) -> Result<PostWithAuthor> {
        let author = Account {
            id: self.post.user_id,
            username: self.author_username,
            gender: Gender::try_from(self.author_gender)?,
            birth_date: self.author_birth_date,
            banned: self.author_banned,
            private: self.author_private,
        };
        Ok(PostWithAuthor {
            post: self.post.into_post(tags)?,
            author,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TagRow {
    post_id: Uuid,
    account_id: Uuid,
    username: String,
}

/// PostgreSQL post store
#[derive(Clone)]
pub struct PgPostStore {
    pool: PgPool,
}

impl PgPostStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_tags(&self, post_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<AuthorSummary>>> {
        let mut tags: HashMap<Uuid, Vec<AuthorSummary>> = HashMap::new();
        if post_ids.is_empty() {
            return Ok(tags);
        }

        let rows = sqlx::query_as::<_, TagRow>(
            r#"
            SELECT pt.post_id, a.id AS account_id, a.username
            FROM post_tags pt
            JOIN accounts a ON a.id = pt.account_id
            WHERE pt.post_id = ANY($1)
            "#,
        )
        .bind(post_ids)
        .fetch_all(&self.pool)
        .await
        .context("Failed to load post tags")?;

        for row in rows {
            tags.entry(row.post_id).or_default().push(AuthorSummary {
                id: row.account_id,
                username: row.username,
            });
        }
        Ok(tags)
    }

    async fn with_tags(&self, rows: Vec<PostAuthorRow>) -> Result<Vec<PostWithAuthor>> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.post.id).collect();
        let mut tags = self.load_tags(&ids).await?;

        rows.into_iter()
            .map(|row| {
                let post_tags = tags.remove(&row.post.id).unwrap_or_default();
                row.into_domain(post_tags)
            })
            .collect()
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostWithAuthor>> {
        let sql = format!(
            "SELECT {} FROM posts p JOIN accounts a ON a.id = p.user_id WHERE p.id = $1",
            POST_WITH_AUTHOR_COLUMNS
        );
        let row = sqlx::query_as::<_, PostAuthorRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch post")?;

        match row {
            Some(row) => Ok(self.with_tags(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn find_where(&self, filter: &PostFilter) -> Result<Vec<PostWithAuthor>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM posts p
            JOIN accounts a ON a.id = p.user_id
            WHERE ($1::uuid IS NULL OR p.user_id = $1)
              AND ($2::uuid[] IS NULL OR p.id = ANY($2))
              AND ($3::boolean IS NULL OR p.campaign = $3)
              AND ($4::boolean IS NULL OR p.removed = $4)
            ORDER BY p.creation_date DESC, p.id
            "#,
            POST_WITH_AUTHOR_COLUMNS
        );
        let rows = sqlx::query_as::<_, PostAuthorRow>(&sql)
            .bind(filter.author_id)
            .bind(filter.ids.as_deref())
            .bind(filter.campaign)
            .bind(filter.removed)
            .fetch_all(&self.pool)
            .await
            .context("Failed to query posts")?;

        self.with_tags(rows).await
    }

    async fn followed_authors_feed(&self, viewer_id: Uuid) -> Result<Vec<PostView>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM relations f
            JOIN accounts a ON a.id = f.object_id
            JOIN posts p ON p.user_id = a.id
            WHERE f.subject_id = $1
              AND f.type = $2
              AND f.pending = FALSE
              AND a.banned = FALSE
              AND p.removed = FALSE
              AND p.hidden = FALSE
              AND NOT EXISTS (
                  SELECT 1 FROM relations x
                  WHERE x.subject_id = $1 AND x.object_id = a.id AND x.type IN ($3, $4)
              )
              AND NOT EXISTS (
                  SELECT 1 FROM relations x
                  WHERE x.subject_id = a.id AND x.object_id = $1 AND x.type = $4
              )
            "#,
            POST_WITH_AUTHOR_COLUMNS
        );
        let rows = sqlx::query_as::<_, PostAuthorRow>(&sql)
            .bind(viewer_id)
            .bind(i16::from(RelationType::Follow))
            .bind(i16::from(RelationType::Mute))
            .bind(i16::from(RelationType::Block))
            .fetch_all(&self.pool)
            .await
            .context("Failed to query followed authors feed")?;

        debug!(%viewer_id, candidates = rows.len(), "Loaded organic feed candidates");

        Ok(self
            .with_tags(rows)
            .await?
            .into_iter()
            .map(PostWithAuthor::into_view)
            .collect())
    }

    async fn insert(&self, new_post: &NewPost) -> Result<Post> {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let row = sqlx::query_as::<_, PostRow>(
            r#"
            INSERT INTO posts (
                id, user_id, description, image, creation_date, exposure_date,
                removed, hidden, campaign, gender_filter, age_filter_low, age_filter_high
            )
            VALUES ($1, $2, $3, $4, $5, $6, FALSE, $7, FALSE, $8, $9, $10)
            RETURNING id, user_id, description, image, creation_date, exposure_date,
                      removed, hidden, campaign, gender_filter, age_filter_low, age_filter_high
            "#,
        )
        .bind(id)
        .bind(new_post.user_id)
        .bind(&new_post.description)
        .bind(&new_post.image)
        .bind(now)
        .bind(new_post.exposure_date.unwrap_or(now))
        .bind(new_post.hidden)
        .bind(i16::from(new_post.targeting.gender))
        .bind(new_post.targeting.age_low)
        .bind(new_post.targeting.age_high)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to insert post")?;

        if !new_post.tag_ids.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO post_tags (post_id, account_id)
                SELECT $1, a.id FROM accounts a WHERE a.id = ANY($2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(id)
            .bind(&new_post.tag_ids)
            .execute(&mut *tx)
            .await
            .context("Failed to insert post tags")?;
        }

        tx.commit().await.context("Failed to commit post insert")?;

        let tags = self.load_tags(&[id]).await?.remove(&id).unwrap_or_default();
        row.into_post(tags)
    }

    async fn mark_removed(&self, id: Uuid) -> Result<bool> {
        let affected = sqlx::query("UPDATE posts SET removed = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to mark post removed")?
            .rows_affected();

        Ok(affected > 0)
    }

    async fn activate_campaign(&self, id: Uuid, exposure_date: DateTime<Utc>) -> Result<bool> {
        let affected = sqlx::query(
            r#"
            UPDATE posts
            SET campaign = TRUE, hidden = FALSE, exposure_date = $2
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(exposure_date)
        .execute(&self.pool)
        .await
        .context("Failed to activate campaign")?
        .rows_affected();

        Ok(affected > 0)
    }
}
