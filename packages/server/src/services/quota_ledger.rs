use chrono::Utc;
use sea_orm::prelude::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::entity::user;

#[derive(Debug, Error)]
pub enum QuotaError {
    #[error("no quota account for user {0}")]
    AccountNotFound(Uuid),

    #[error("storage quota exceeded: {used} + {requested} > {limit}")]
    Exceeded {
        limit: i64,
        used: i64,
        requested: i64,
    },

    #[error(transparent)]
    Database(#[from] DbErr),
}

/// A user's storage budget and running consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuotaAccount {
    pub user_id: Uuid,
    pub limit_bytes: i64,
    pub used_bytes: i64,
}

impl QuotaAccount {
    pub fn available_bytes(&self) -> i64 {
        (self.limit_bytes - self.used_bytes).max(0)
    }

    /// Whether `bytes` more can be charged without exceeding the limit.
    pub fn can_absorb(&self, bytes: i64) -> bool {
        self.used_bytes
            .checked_add(bytes)
            .is_some_and(|total| total <= self.limit_bytes)
    }

    fn exceeded(&self, requested: i64) -> QuotaError {
        QuotaError::Exceeded {
            limit: self.limit_bytes,
            used: self.used_bytes,
            requested,
        }
    }
}

impl From<&user::Model> for QuotaAccount {
    fn from(user: &user::Model) -> Self {
        Self {
            user_id: user.id,
            limit_bytes: user.storage_quota,
            used_bytes: user.storage_used,
        }
    }
}

/// Per-user storage accounting over the `users` table.
pub struct QuotaLedger<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> QuotaLedger<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn get_account(&self, user_id: Uuid) -> Result<QuotaAccount, QuotaError> {
        user::Entity::find_by_id(user_id)
            .one(self.conn)
            .await?
            .map(|u| QuotaAccount::from(&u))
            .ok_or(QuotaError::AccountNotFound(user_id))
    }

    /// Read-only check that `bytes` would fit. Never mutates state.
    pub async fn ensure_capacity(
        &self,
        user_id: Uuid,
        bytes: i64,
    ) -> Result<QuotaAccount, QuotaError> {
        let account = self.get_account(user_id).await?;
        if !account.can_absorb(bytes) {
            return Err(account.exceeded(bytes));
        }
        Ok(account)
    }

    /// Charge `bytes` to the user if it fits, otherwise fail without changes.
    ///
    /// The check and the increment are one conditional `UPDATE`, so the row
    /// lock taken by the database serializes concurrent charges for the same
    /// user, including charges issued by other server processes.
    pub async fn try_charge(&self, user_id: Uuid, bytes: i64) -> Result<QuotaAccount, QuotaError> {
        if bytes <= 0 {
            return self.get_account(user_id).await;
        }

        let result = user::Entity::update_many()
            .col_expr(
                user::Column::StorageUsed,
                Expr::cust_with_values("\"storage_used\" + ?", [bytes]),
            )
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(user::Column::Id.eq(user_id))
            .filter(Expr::cust_with_values(
                "\"storage_used\" + ? <= \"storage_quota\"",
                [bytes],
            ))
            .exec(self.conn)
            .await?;

        let account = self.get_account(user_id).await?;
        if result.rows_affected == 0 {
            warn!(%user_id, requested = bytes, used = account.used_bytes, limit = account.limit_bytes, "Quota charge rejected");
            return Err(account.exceeded(bytes));
        }

        debug!(%user_id, charged = bytes, used = account.used_bytes, "Quota charged");
        Ok(account)
    }
}
