use chrono::Utc;
use common::storage::{ContentHash, StorageLocation};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, Set,
};
use tracing::debug;
use uuid::Uuid;

use crate::entity::{file, file_content};

/// Result of [`ContentRegistry::register`].
#[derive(Debug, Clone)]
pub struct Registration {
    pub content: file_content::Model,
    /// `true` only for the caller whose insert produced the row. Callers that
    /// lost a race observe the winner's row with `created == false`.
    pub created: bool,
}

/// Authoritative hash -> content mapping, backed by `file_contents`.
///
/// Hash uniqueness is enforced by the unique index on `sha256_hash`, so it
/// holds across processes, not just within this one.
pub struct ContentRegistry<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> ContentRegistry<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn find_by_hash(
        &self,
        hash: &ContentHash,
    ) -> Result<Option<file_content::Model>, DbErr> {
        file_content::Entity::find()
            .filter(file_content::Column::Sha256Hash.eq(hash.to_hex()))
            .one(self.conn)
            .await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<file_content::Model>, DbErr> {
        file_content::Entity::find_by_id(id).one(self.conn).await
    }

    /// Insert-if-absent keyed on the hash, returning the row that ends up
    /// registered.
    ///
    /// A concurrent insert of the same hash is not an error: the conflicting
    /// insert is discarded and the existing row is returned.
    pub async fn register(
        &self,
        hash: &ContentHash,
        size: i64,
        location: &StorageLocation,
    ) -> Result<Registration, DbErr> {
        let id = Uuid::now_v7();
        let model = file_content::ActiveModel {
            id: Set(id),
            sha256_hash: Set(hash.to_hex()),
            size: Set(size),
            storage_path: Set(location.to_string()),
            created_at: Set(Utc::now()),
        };

        let result = file_content::Entity::insert(model)
            .on_conflict(
                OnConflict::column(file_content::Column::Sha256Hash)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.conn)
            .await;

        match result {
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }

        let content = self.find_by_hash(hash).await?.ok_or_else(|| {
            DbErr::Custom("content row missing after insert-if-absent".to_string())
        })?;

        let created = content.id == id;
        if !created {
            debug!(hash = %hash, "Content registered concurrently, using existing row");
        }

        Ok(Registration { content, created })
    }

    /// Number of file references pointing at a content row.
    ///
    /// Informational only; nothing is ever deleted based on this count.
    pub async fn count_references(&self, content_id: Uuid) -> Result<u64, DbErr> {
        file::Entity::find()
            .filter(file::Column::FileContentId.eq(content_id))
            .count(self.conn)
            .await
    }
}
