use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Audit record written for every successful download.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "download_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(indexed)]
    pub file_id: Uuid,
    #[sea_orm(belongs_to, from = "file_id", to = "id", on_delete = "Cascade")]
    pub file: HasOne<super::file::Entity>,

    /// NULL for anonymous downloads through a public share link.
    pub user_id: Option<Uuid>,

    pub ip_address: Option<String>,
    pub user_agent: Option<String>,

    #[sea_orm(indexed)]
    pub downloaded_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
