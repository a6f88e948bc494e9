use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::AccountStore;
use crate::domain::{Account, Gender};

#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    username: String,
    gender: i16,
    birth_date: DateTime<Utc>,
    banned: bool,
    private: bool,
}

impl TryFrom<AccountRow> for Account {
    type Error = anyhow::Error;

    fn try_from(row: AccountRow) -> Result<Self> {
        Ok(Account {
            id: row.id,
            username: row.username,
            gender: Gender::try_from(row.gender)?,
            birth_date: row.birth_date,
            banned: row.banned,
            private: row.private,
        })
    }
}

/// PostgreSQL account store
#[derive(Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, username, gender, birth_date, banned, private
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch account")?;

        row.map(Account::try_from).transpose()
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Account>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, username, gender, birth_date, banned, private
            FROM accounts
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch accounts by ids")?;

        rows.into_iter().map(Account::try_from).collect()
    }

    async fn insert(&self, account: &Account) -> Result<Account> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            INSERT INTO accounts (id, username, gender, birth_date, banned, private)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                username = EXCLUDED.username,
                gender = EXCLUDED.gender,
                birth_date = EXCLUDED.birth_date,
                banned = EXCLUDED.banned,
                private = EXCLUDED.private
            RETURNING id, username, gender, birth_date, banned, private
            "#,
        )
        .bind(account.id)
        .bind(&account.username)
        .bind(i16::from(account.gender))
        .bind(account.birth_date)
        .bind(account.banned)
        .bind(account.private)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert account")?;

        debug!("Upserted account: {} ({})", account.id, account.username);
        Account::try_from(row)
    }

    async fn update(&self, account: &Account) -> Result<bool> {
        let affected = sqlx::query(
            r#"
            UPDATE accounts
            SET username = $2, gender = $3, birth_date = $4, banned = $5, private = $6
            WHERE id = $1
            "#,
        )
        .bind(account.id)
        .bind(&account.username)
        .bind(i16::from(account.gender))
        .bind(account.birth_date)
        .bind(account.banned)
        .bind(account.private)
        .execute(&self.pool)
        .await
        .context("Failed to update account")?
        .rows_affected();

        Ok(affected > 0)
    }
}
