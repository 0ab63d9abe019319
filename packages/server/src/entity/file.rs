use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A user's named reference to a piece of stored content.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "files")]
pub struct Model {
    /// UUIDv7 primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(indexed)]
    pub user_id: Uuid,
    #[sea_orm(belongs_to, from = "user_id", to = "id", on_delete = "Cascade")]
    pub user: HasOne<super::user::Entity>,

    #[sea_orm(indexed)]
    pub file_content_id: Uuid,
    #[sea_orm(
        belongs_to,
        from = "file_content_id",
        to = "id",
        on_delete = "Cascade"
    )]
    pub file_content: HasOne<super::file_content::Entity>,

    pub name: String,
    pub mime_type: String,
    pub is_public: bool,

    /// Purposefully denormalized from `file_contents.size` to avoid JOINs for list queries.
    pub size: i64,

    #[sea_orm(has_many)]
    pub shares: HasMany<super::file_share::Entity>,

    #[sea_orm(has_many)]
    pub download_logs: HasMany<super::download_log::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
