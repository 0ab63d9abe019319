use std::collections::HashMap;

use chrono::Utc;
use common::storage::{BoxReader, ContentStore, StorageError, StorageLocation};
use sea_orm::prelude::Expr;
use sea_orm::*;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::entity::{download_log, file, file_content};

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("content row {0} is missing")]
    ContentRowMissing(Uuid),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Database(#[from] DbErr),
}

/// Who fetched a file.
#[derive(Debug, Clone, Default)]
pub struct Downloader {
    /// `None` for anonymous public-share downloads.
    pub user_id: Option<Uuid>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Content row behind `file`.
pub async fn find_content<C: ConnectionTrait>(
    conn: &C,
    file: &file::Model,
) -> Result<file_content::Model, DownloadError> {
    file_content::Entity::find_by_id(file.file_content_id)
        .one(conn)
        .await?
        .ok_or(DownloadError::ContentRowMissing(file.file_content_id))
}

/// Open a reader over the stored bytes of `content`.
pub async fn open_reader(
    store: &dyn ContentStore,
    content: &file_content::Model,
) -> Result<BoxReader, DownloadError> {
    let location = StorageLocation::parse(&content.storage_path)?;
    Ok(store.read_stream(&location).await?)
}

pub async fn record_download<C: ConnectionTrait>(
    conn: &C,
    file_id: Uuid,
    who: Downloader,
) -> Result<(), DbErr> {
    download_log::ActiveModel {
        id: Set(Uuid::now_v7()),
        file_id: Set(file_id),
        user_id: Set(who.user_id),
        ip_address: Set(who.ip_address),
        user_agent: Set(who.user_agent),
        downloaded_at: Set(Utc::now()),
    }
    .insert(conn)
    .await?;
    Ok(())
}

/// Record a download without failing the transfer if logging fails.
pub async fn record_download_best_effort<C: ConnectionTrait>(
    conn: &C,
    file_id: Uuid,
    who: Downloader,
) {
    if let Err(e) = record_download(conn, file_id, who).await {
        warn!(%file_id, error = %e, "Failed to record download");
    }
}

/// Download counts for the given files. Files never downloaded are absent.
pub async fn count_by_file<C: ConnectionTrait>(
    conn: &C,
    file_ids: &[Uuid],
) -> Result<HashMap<Uuid, u64>, DbErr> {
    if file_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = download_log::Entity::find()
        .select_only()
        .column(download_log::Column::FileId)
        .column_as(Expr::cust("COUNT(*)::BIGINT"), "downloads")
        .filter(download_log::Column::FileId.is_in(file_ids.iter().copied()))
        .group_by(download_log::Column::FileId)
        .into_tuple::<(Uuid, i64)>()
        .all(conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(id, n)| (id, u64::try_from(n).unwrap_or(0)))
        .collect())
}
