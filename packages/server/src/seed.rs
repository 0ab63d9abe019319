use sea_orm::sea_query::{Index, IndexCreateStatement, PostgresQueryBuilder};
use sea_orm::*;
use tracing::{info, warn};

use crate::entity::{download_log, file};

fn composite_indexes() -> Vec<(&'static str, IndexCreateStatement)> {
    vec![
        // Per-user listing, newest first.
        (
            "idx_files_user_created",
            Index::create()
                .if_not_exists()
                .name("idx_files_user_created")
                .table(file::Entity)
                .col(file::Column::UserId)
                .col(file::Column::CreatedAt)
                .to_owned(),
        ),
        // Download counts per file in the admin listing.
        (
            "idx_download_logs_file_downloaded",
            Index::create()
                .if_not_exists()
                .name("idx_download_logs_file_downloaded")
                .table(download_log::Entity)
                .col(download_log::Column::FileId)
                .col(download_log::Column::DownloadedAt)
                .to_owned(),
        ),
    ]
}

/// Ensure required database indexes exist.
///
/// SeaORM's schema-sync doesn't support composite non-unique indexes,
/// so we create them manually on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    for (name, stmt) in composite_indexes() {
        match db
            .execute_unprepared(&stmt.to_string(PostgresQueryBuilder))
            .await
        {
            Ok(_) => info!("Ensured index {} exists", name),
            Err(e) => warn!("Failed to create index {}: {}", name, e),
        }
    }
    Ok(())
}
