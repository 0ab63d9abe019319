use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::file;
use crate::services::upload::DuplicateInfo;

/// A user's file reference.
#[derive(Serialize, utoipa::ToSchema)]
pub struct FileResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Shared content this file points at. Equal for byte-identical uploads.
    pub file_content_id: Uuid,
    #[schema(example = "report.pdf")]
    pub name: String,
    #[schema(example = "application/pdf")]
    pub mime_type: String,
    pub is_public: bool,
    #[schema(example = 142857)]
    pub size: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<file::Model> for FileResponse {
    fn from(model: file::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            file_content_id: model.file_content_id,
            name: model.name,
            mime_type: model.mime_type,
            is_public: model.is_public,
            size: model.size,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Created file plus whether its bytes were already stored.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UploadResponse {
    #[serde(flatten)]
    pub file: FileResponse,
    pub deduplicated: bool,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FileListQuery {
    /// Case-insensitive substring of the file name.
    pub search: Option<String>,
    /// Exact MIME type.
    pub mime_type: Option<String>,
    pub is_public: Option<bool>,
    /// 1-based page number. Default 1.
    pub page: Option<u64>,
    /// Items per page, 1-100. Default 20.
    pub page_size: Option<u64>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct FileListResponse {
    pub files: Vec<FileResponse>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CheckDuplicateRequest {
    /// 64-character hex SHA-256 digest of the content.
    #[schema(example = "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08")]
    pub sha256_hash: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct DuplicateInfoResponse {
    pub file_size: i64,
    /// When the content was first stored.
    pub uploaded_at: DateTime<Utc>,
    /// Number of files referencing the content.
    pub reference_count: u64,
}

impl From<DuplicateInfo> for DuplicateInfoResponse {
    fn from(info: DuplicateInfo) -> Self {
        Self {
            file_size: info.size,
            uploaded_at: info.created_at,
            reference_count: info.reference_count,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CheckDuplicateResponse {
    pub is_duplicate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_info: Option<DuplicateInfoResponse>,
}
