use chrono::{DateTime, Utc};
use sea_orm::prelude::Expr;
use sea_orm::*;
use serde::Serialize;
use uuid::Uuid;

use crate::entity::{download_log, file, file_content, user};

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct StorageStats {
    /// Sum of the sizes of all file references.
    pub logical_bytes: i64,
    /// Sum of the sizes of all distinct stored contents.
    pub physical_bytes: i64,
    /// `logical_bytes - physical_bytes`.
    pub dedup_savings_bytes: i64,
    /// Percentage of logical bytes saved by deduplication, 0-100.
    pub dedup_ratio: f64,
    pub total_quota_bytes: i64,
    pub total_used_bytes: i64,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct RecentUpload {
    pub id: Uuid,
    pub name: String,
    pub size: i64,
    pub owner_email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct SystemStats {
    pub total_users: u64,
    pub total_files: u64,
    pub unique_contents: u64,
    pub storage: StorageStats,
    pub downloads_total: u64,
    pub downloads_today: u64,
    pub uploads_today: u64,
    pub recent_uploads: Vec<RecentUpload>,
}

const RECENT_UPLOADS: u64 = 10;

fn dedup_ratio(logical: i64, physical: i64) -> f64 {
    if logical <= 0 {
        return 0.0;
    }
    (logical - physical) as f64 / logical as f64 * 100.0
}

async fn sum_column<E, C>(conn: &C, sql: &'static str) -> Result<i64, DbErr>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let total = E::find()
        .select_only()
        .column_as(Expr::cust(sql), "total")
        .into_tuple::<i64>()
        .one(conn)
        .await?;
    Ok(total.unwrap_or(0))
}

pub async fn collect<C: ConnectionTrait>(conn: &C) -> Result<SystemStats, DbErr> {
    let total_users = user::Entity::find().count(conn).await?;
    let total_files = file::Entity::find().count(conn).await?;
    let unique_contents = file_content::Entity::find().count(conn).await?;

    let logical_bytes =
        sum_column::<file::Entity, _>(conn, "COALESCE(SUM(\"size\"), 0)::BIGINT").await?;
    let physical_bytes =
        sum_column::<file_content::Entity, _>(conn, "COALESCE(SUM(\"size\"), 0)::BIGINT").await?;
    let total_quota_bytes =
        sum_column::<user::Entity, _>(conn, "COALESCE(SUM(\"storage_quota\"), 0)::BIGINT").await?;
    let total_used_bytes =
        sum_column::<user::Entity, _>(conn, "COALESCE(SUM(\"storage_used\"), 0)::BIGINT").await?;

    let start_of_day = Utc::now()
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|t| t.and_utc())
        .unwrap_or_else(Utc::now);

    let downloads_total = download_log::Entity::find().count(conn).await?;
    let downloads_today = download_log::Entity::find()
        .filter(download_log::Column::DownloadedAt.gte(start_of_day))
        .count(conn)
        .await?;
    let uploads_today = file::Entity::find()
        .filter(file::Column::CreatedAt.gte(start_of_day))
        .count(conn)
        .await?;

    let recent_uploads = file::Entity::find()
        .find_also_related(user::Entity)
        .order_by_desc(file::Column::CreatedAt)
        .limit(Some(RECENT_UPLOADS))
        .all(conn)
        .await?
        .into_iter()
        .map(|(f, owner)| RecentUpload {
            id: f.id,
            name: f.name,
            size: f.size,
            owner_email: owner.map(|u| u.email).unwrap_or_default(),
            created_at: f.created_at,
        })
        .collect();

    Ok(SystemStats {
        total_users,
        total_files,
        unique_contents,
        storage: StorageStats {
            logical_bytes,
            physical_bytes,
            dedup_savings_bytes: logical_bytes - physical_bytes,
            dedup_ratio: dedup_ratio(logical_bytes, physical_bytes),
            total_quota_bytes,
            total_used_bytes,
        },
        downloads_total,
        downloads_today,
        uploads_today,
        recent_uploads,
    })
}
