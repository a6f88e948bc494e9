use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::PostRelationStore;
use crate::domain::{PostRelation, PostRelationType};

#[derive(Debug, sqlx::FromRow)]
struct PostRelationRow {
    post_id: Uuid,
    user_id: Uuid,
    #[sqlx(rename = "type")]
    kind: i16,
}

impl TryFrom<PostRelationRow> for PostRelation {
    type Error = anyhow::Error;

    fn try_from(row: PostRelationRow) -> Result<Self> {
        Ok(PostRelation {
            post_id: row.post_id,
            user_id: row.user_id,
            kind: PostRelationType::try_from(row.kind)?,
        })
    }
}

/// PostgreSQL store for likes, dislikes and saves
#[derive(Clone)]
pub struct PgPostRelationStore {
    pool: PgPool,
}

impl PgPostRelationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRelationStore for PgPostRelationStore {
    async fn put(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        kind: PostRelationType,
    ) -> Result<PostRelation> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        if let Some(opposite) = kind.opposite() {
            sqlx::query(
                "DELETE FROM post_relations WHERE post_id = $1 AND user_id = $2 AND type = $3",
            )
            .bind(post_id)
            .bind(user_id)
            .bind(i16::from(opposite))
            .execute(&mut *tx)
            .await
            .context("Failed to drop opposite post relation")?;
        }

        sqlx::query(
            r#"
            INSERT INTO post_relations (post_id, user_id, type)
            VALUES ($1, $2, $3)
            ON CONFLICT (post_id, user_id, type) DO NOTHING
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .bind(i16::from(kind))
        .execute(&mut *tx)
        .await
        .context("Failed to insert post relation")?;

        tx.commit().await.context("Failed to commit post relation")?;

        debug!(%post_id, %user_id, ?kind, "Stored post relation");
        Ok(PostRelation {
            post_id,
            user_id,
            kind,
        })
    }

    async fn delete(&self, post_id: Uuid, user_id: Uuid, kind: PostRelationType) -> Result<bool> {
        let affected = sqlx::query(
            "DELETE FROM post_relations WHERE post_id = $1 AND user_id = $2 AND type = $3",
        )
        .bind(post_id)
        .bind(user_id)
        .bind(i16::from(kind))
        .execute(&self.pool)
        .await
        .context("Failed to delete post relation")?
        .rows_affected();

        Ok(affected > 0)
    }

    async fn find_for_user(
        &self,
        user_id: Uuid,
        kind: PostRelationType,
    ) -> Result<Vec<PostRelation>> {
        let rows = sqlx::query_as::<_, PostRelationRow>(
            r#"
            SELECT post_id, user_id, type
            FROM post_relations
            WHERE user_id = $1 AND type = $2
            "#,
        )
        .bind(user_id)
        .bind(i16::from(kind))
        .fetch_all(&self.pool)
        .await
        .context("Failed to query post relations for user")?;

        rows.into_iter().map(PostRelation::try_from).collect()
    }

    async fn find_for_post(&self, post_id: Uuid) -> Result<Vec<PostRelation>> {
        let rows = sqlx::query_as::<_, PostRelationRow>(
            "SELECT post_id, user_id, type FROM post_relations WHERE post_id = $1",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to query post relations for post")?;

        rows.into_iter().map(PostRelation::try_from).collect()
    }
}
