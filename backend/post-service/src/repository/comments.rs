use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::CommentStore;
use crate::domain::{Account, Comment, CommentWithAuthor, Gender};

#[derive(Debug, sqlx::FromRow)]
struct CommentRow {
    id: Uuid,
    post_id: Uuid,
    user_id: Uuid,
    content: String,
    creation_date: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            post_id: row.post_id,
            user_id: row.user_id,
            content: row.content,
            creation_date: row.creation_date,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CommentAuthorRow {
    #[sqlx(flatten)]
    comment: CommentRow,
    author_username: String,
    author_gender: i16,
    author_birth_date: DateTime<Utc>,
    author_banned: bool,
    author_private: bool,
}

/// PostgreSQL comment store
#[derive(Clone)]
pub struct PgCommentStore {
    pool: PgPool,
}

impl PgCommentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentStore for PgCommentStore {
    async fn insert(&self, comment: &Comment) -> Result<Comment> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            INSERT INTO comments (id, post_id, user_id, content, creation_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, post_id, user_id, content, creation_date
            "#,
        )
        .bind(comment.id)
        .bind(comment.post_id)
        .bind(comment.user_id)
        .bind(&comment.content)
        .bind(comment.creation_date)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert comment")?;

        Ok(row.into())
    }

    async fn find_for_post(&self, post_id: Uuid) -> Result<Vec<CommentWithAuthor>> {
        let rows = sqlx::query_as::<_, CommentAuthorRow>(
            r#"
            SELECT c.id, c.post_id, c.user_id, c.content, c.creation_date,
                   a.username AS author_username, a.gender AS author_gender,
                   a.birth_date AS author_birth_date, a.banned AS author_banned,
                   a.private AS author_private
            FROM comments c
            JOIN accounts a ON a.id = c.user_id
            WHERE c.post_id = $1
            ORDER BY c.creation_date DESC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to query comments")?;

        rows.into_iter()
            .map(|row| {
                let author = Account {
                    id: row.comment.user_id,
                    username: row.author_username,
                    gender: Gender::try_from(row.author_gender)?,
                    birth_date: row.author_birth_date,
                    banned: row.author_banned,
                    private: row.author_private,
                };
                Ok(CommentWithAuthor {
                    comment: row.comment.into(),
                    author,
                })
            })
            .collect()
    }
}
