//! Deduplicating upload pipeline.
//!
//! Content is written to the store and charged to a quota at most once per
//! distinct SHA-256 digest. Every upload, duplicate or not, produces its own
//! file reference pointing at the shared content row.

use chrono::{DateTime, Utc};
use common::storage::{ContentHash, ContentStore, StorageError};
use sea_orm::{DatabaseConnection, DbErr, TransactionTrait};
use thiserror::Error;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::entity::file;
use crate::services::content_registry::ContentRegistry;
use crate::services::file_catalog::{FileCatalog, NewFileReference};
use crate::services::quota_ledger::{QuotaError, QuotaLedger};

pub const MAX_NAME_CHARS: usize = 255;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Quota(#[from] QuotaError),

    #[error("failed to write content: {0}")]
    StorageWrite(StorageError),

    #[error(transparent)]
    Database(#[from] DbErr),
}

#[derive(Debug)]
pub struct UploadRequest {
    pub user_id: Uuid,
    pub data: Vec<u8>,
    pub name: String,
    pub mime_type: String,
    pub is_public: bool,
}

#[derive(Debug)]
pub struct UploadOutcome {
    pub file: file::Model,
    /// The bytes were already stored before this upload.
    pub deduplicated: bool,
    /// Bytes added to the uploader's `storage_used`. Zero for duplicates.
    pub charged_bytes: i64,
}

/// What is known about already-stored content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateInfo {
    pub size: i64,
    pub created_at: DateTime<Utc>,
    pub reference_count: u64,
}

/// Trimmed display name, or the reason it is unacceptable.
pub fn validate_name(name: &str) -> Result<&str, UploadError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(UploadError::InvalidInput("Name must not be empty".into()));
    }
    if trimmed.chars().any(char::is_control) {
        return Err(UploadError::InvalidInput(
            "Name must not contain control characters".into(),
        ));
    }
    if trimmed.chars().count() > MAX_NAME_CHARS {
        return Err(UploadError::InvalidInput(format!(
            "Name must be at most {MAX_NAME_CHARS} characters"
        )));
    }
    Ok(trimmed)
}

pub struct UploadService<'a> {
    db: &'a DatabaseConnection,
    store: &'a dyn ContentStore,
}

impl<'a> UploadService<'a> {
    pub fn new(db: &'a DatabaseConnection, store: &'a dyn ContentStore) -> Self {
        Self { db, store }
    }

    #[instrument(skip(self, req), fields(user_id = %req.user_id, size = req.data.len()))]
    pub async fn upload(&self, req: UploadRequest) -> Result<UploadOutcome, UploadError> {
        if req.data.is_empty() {
            return Err(UploadError::InvalidInput("File is empty".into()));
        }
        let name = validate_name(&req.name)?.to_string();

        let hash = ContentHash::compute(&req.data);
        let size = i64::try_from(req.data.len())
            .map_err(|_| UploadError::InvalidInput("File is too large".into()))?;

        let existing = ContentRegistry::new(self.db).find_by_hash(&hash).await?;

        if let Some(content) = existing {
            debug!(%hash, content_id = %content.id, "Content already stored, adding reference");
            let file = FileCatalog::new(self.db)
                .create_reference(NewFileReference {
                    user_id: req.user_id,
                    file_content_id: content.id,
                    name,
                    mime_type: req.mime_type,
                    is_public: req.is_public,
                    size: content.size,
                })
                .await?;
            return Ok(UploadOutcome {
                file,
                deduplicated: true,
                charged_bytes: 0,
            });
        }

        QuotaLedger::new(self.db)
            .ensure_capacity(req.user_id, size)
            .await?;

        let location = self
            .store
            .write(&hash, &req.data)
            .await
            .map_err(UploadError::StorageWrite)?;

        // Register, charge and reference commit together or not at all.
        // Bytes already on disk are reused by the next upload of this hash.
        let txn = self.db.begin().await?;

        let registration = ContentRegistry::new(&txn)
            .register(&hash, size, &location)
            .await?;

        let charged_bytes = if registration.created {
            QuotaLedger::new(&txn).try_charge(req.user_id, size).await?;
            size
        } else {
            0
        };

        let file = FileCatalog::new(&txn)
            .create_reference(NewFileReference {
                user_id: req.user_id,
                file_content_id: registration.content.id,
                name,
                mime_type: req.mime_type,
                is_public: req.is_public,
                size: registration.content.size,
            })
            .await?;

        txn.commit().await?;

        info!(
            %hash,
            file_id = %file.id,
            created = registration.created,
            charged_bytes,
            "Upload stored"
        );

        Ok(UploadOutcome {
            file,
            deduplicated: !registration.created,
            charged_bytes,
        })
    }

    /// Side-effect-free lookup of content by digest.
    pub async fn check_duplicate(
        &self,
        hash: &ContentHash,
    ) -> Result<Option<DuplicateInfo>, DbErr> {
        let registry = ContentRegistry::new(self.db);
        let Some(content) = registry.find_by_hash(hash).await? else {
            return Ok(None);
        };
        let reference_count = registry.count_references(content.id).await?;
        Ok(Some(DuplicateInfo {
            size: content.size,
            created_at: content.created_at,
            reference_count,
        }))
    }
}
