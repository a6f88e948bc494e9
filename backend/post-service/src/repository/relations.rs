use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::{RelationFilter, RelationStore};
use crate::domain::{Relation, RelationType};

#[derive(Debug, sqlx::FromRow)]
struct RelationRow {
    subject_id: Uuid,
    object_id: Uuid,
    #[sqlx(rename = "type")]
    kind: i16,
    pending: bool,
}

impl TryFrom<RelationRow> for Relation {
    type Error = anyhow::Error;

    fn try_from(row: RelationRow) -> Result<Self> {
        Ok(Relation {
            subject_id: row.subject_id,
            object_id: row.object_id,
            kind: RelationType::try_from(row.kind)?,
            pending: row.pending,
        })
    }
}

/// PostgreSQL relation store (follow / mute / block edges)
#[derive(Clone)]
pub struct PgRelationStore {
    pool: PgPool,
}

impl PgRelationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RelationStore for PgRelationStore {
    async fn find_where(&self, filter: &RelationFilter) -> Result<Vec<Relation>> {
        let rows = sqlx::query_as::<_, RelationRow>(
            r#"
            SELECT subject_id, object_id, type, pending
            FROM relations
            WHERE ($1::uuid IS NULL OR subject_id = $1)
              AND ($2::uuid IS NULL OR object_id = $2)
              AND ($3::smallint IS NULL OR type = $3)
              AND ($4::boolean IS NULL OR pending = $4)
            "#,
        )
        .bind(filter.subject_id)
        .bind(filter.object_id)
        .bind(filter.kind.map(i16::from))
        .bind(filter.pending)
        .fetch_all(&self.pool)
        .await
        .context("Failed to query relations")?;

        rows.into_iter().map(Relation::try_from).collect()
    }

    async fn upsert(&self, relation: &Relation) -> Result<Relation> {
        let row = sqlx::query_as::<_, RelationRow>(
            r#"
            INSERT INTO relations (subject_id, object_id, type, pending, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (subject_id, object_id, type) DO UPDATE
            SET pending = EXCLUDED.pending
            RETURNING subject_id, object_id, type, pending
            "#,
        )
        .bind(relation.subject_id)
        .bind(relation.object_id)
        .bind(i16::from(relation.kind))
        .bind(relation.pending)
        .fetch_one(&self.pool)
        .await
        .context("Failed to upsert relation")?;

        debug!(
            "Upserted {:?} relation: {} -> {} (pending={})",
            relation.kind, relation.subject_id, relation.object_id, relation.pending
        );
        Relation::try_from(row)
    }

    async fn set_pending(
        &self,
        subject_id: Uuid,
        object_id: Uuid,
        kind: RelationType,
        pending: bool,
    ) -> Result<bool> {
        let affected = sqlx::query(
            r#"
            UPDATE relations SET pending = $4
            WHERE subject_id = $1 AND object_id = $2 AND type = $3
            "#,
        )
        .bind(subject_id)
        .bind(object_id)
        .bind(i16::from(kind))
        .bind(pending)
        .execute(&self.pool)
        .await
        .context("Failed to update relation")?
        .rows_affected();

        Ok(affected > 0)
    }

    async fn delete(&self, subject_id: Uuid, object_id: Uuid, kind: RelationType) -> Result<bool> {
        let affected = sqlx::query(
            "DELETE FROM relations WHERE subject_id = $1 AND object_id = $2 AND type = $3",
        )
        .bind(subject_id)
        .bind(object_id)
        .bind(i16::from(kind))
        .execute(&self.pool)
        .await
        .context("Failed to delete relation")?
        .rows_affected();

        debug!("Deleted {:?} relation: {} -> {}", kind, subject_id, object_id);
        Ok(affected > 0)
    }
}
