use chrono::{DateTime, Utc};
use rand::Rng;
use sea_orm::*;
use uuid::Uuid;

use crate::entity::{file, file_share};

/// Share token: the first 8 characters of the file id, a dash, then 16
/// random hex characters.
pub fn generate_token(file_id: Uuid) -> String {
    let random: [u8; 8] = rand::rng().random();
    let id = file_id.simple().to_string();
    format!("{}-{}", &id[..8], hex::encode(random))
}

pub fn is_expired(share: &file_share::Model, now: DateTime<Utc>) -> bool {
    expired_at(share.expires_at, now)
}

fn expired_at(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    expires_at.is_some_and(|at| at <= now)
}

pub struct ShareService<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> ShareService<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn create(
        &self,
        file_id: Uuid,
        is_public: bool,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<file_share::Model, DbErr> {
        file_share::ActiveModel {
            id: Set(Uuid::now_v7()),
            file_id: Set(file_id),
            share_token: Set(generate_token(file_id)),
            is_public: Set(is_public),
            expires_at: Set(expires_at),
            created_at: Set(Utc::now()),
        }
        .insert(self.conn)
        .await
    }

    /// Look up a share and its file. Expired shares resolve to `None`.
    pub async fn find_active(
        &self,
        token: &str,
    ) -> Result<Option<(file_share::Model, file::Model)>, DbErr> {
        let Some(share) = file_share::Entity::find()
            .filter(file_share::Column::ShareToken.eq(token))
            .one(self.conn)
            .await?
        else {
            return Ok(None);
        };

        if is_expired(&share, Utc::now()) {
            return Ok(None);
        }

        let file = file::Entity::find_by_id(share.file_id).one(self.conn).await?;
        Ok(file.map(|f| (share, f)))
    }
}
