/// Account and relation mirroring
///
/// Accounts and the follow/mute/block graph are owned by other services and pushed
/// here so the visibility rules can be evaluated locally.
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::{Account, Relation};
use crate::error::{ServiceError, ServiceResult};
use crate::repository::{AccountStore, RelationStore, Stores};

#[derive(Clone)]
pub struct AccountService {
    accounts: Arc<dyn AccountStore>,
    relations: Arc<dyn RelationStore>,
}

impl AccountService {
    pub fn new(stores: &Stores) -> Self {
        Self {
            accounts: stores.accounts.clone(),
            relations: stores.relations.clone(),
        }
    }

    pub async fn create_account(&self, account: Account) -> ServiceResult<Account> {
        let stored = self.accounts.insert(&account).await?;
        info!(account_id = %stored.id, "Account stored");
        Ok(stored)
    }

    pub async fn update_account(&self, account: Account) -> ServiceResult<()> {
        if !self.accounts.update(&account).await? {
            return Err(ServiceError::user_not_found());
        }
        debug!(
            account_id = %account.id,
            banned = account.banned,
            private = account.private,
            "Account updated"
        );
        Ok(())
    }

    pub async fn create_relation(&self, relation: Relation) -> ServiceResult<Relation> {
        self.require_account(relation.object_id).await?;
        let stored = self.relations.upsert(&relation).await?;
        debug!(
            subject = %stored.subject_id,
            object = %stored.object_id,
            kind = ?stored.kind,
            pending = stored.pending,
            "Relation stored"
        );
        Ok(stored)
    }

    /// Only `pending` is mutable; used to accept follow requests.
    pub async fn update_relation(&self, relation: Relation) -> ServiceResult<()> {
        self.require_account(relation.object_id).await?;
        let updated = self
            .relations
            .set_pending(
                relation.subject_id,
                relation.object_id,
                relation.kind,
                relation.pending,
            )
            .await?;
        if !updated {
            return Err(ServiceError::not_found("base", "Relation not found!"));
        }
        Ok(())
    }

    /// Deleting an absent relation is not an error.
    pub async fn delete_relation(&self, relation: Relation) -> ServiceResult<()> {
        let deleted = self
            .relations
            .delete(relation.subject_id, relation.object_id, relation.kind)
            .await?;
        debug!(
            subject = %relation.subject_id,
            object = %relation.object_id,
            deleted,
            "Relation deleted"
        );
        Ok(())
    }

    async fn require_account(&self, id: Uuid) -> ServiceResult<Account> {
        self.accounts
            .find_by_id(id)
            .await?
            .ok_or_else(ServiceError::user_not_found)
    }
}
