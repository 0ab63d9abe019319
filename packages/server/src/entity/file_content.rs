use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One row per distinct piece of stored content.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "file_contents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// 64-character lowercase hex SHA-256 digest.
    #[sea_orm(unique)]
    pub sha256_hash: String,

    pub size: i64,

    /// Location relative to the content store root (`<shard>/<hash>`).
    #[serde(skip_serializing)]
    pub storage_path: String,

    pub created_at: DateTimeUtc,

    #[sea_orm(has_many)]
    pub files: HasMany<super::file::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
