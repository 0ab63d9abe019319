use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::accounts::AccountUsage;

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AdminFileListQuery {
    /// Case-insensitive substring of the file name.
    pub search: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AdminFileItem {
    pub id: Uuid,
    pub name: String,
    pub mime_type: String,
    pub size: i64,
    pub is_public: bool,
    pub file_content_id: Uuid,
    pub user_id: Uuid,
    #[schema(example = "alice@example.com")]
    pub owner_email: String,
    pub download_count: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AdminFileListResponse {
    pub files: Vec<AdminFileItem>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AdminUserListQuery {
    /// Case-insensitive substring of the email.
    pub search: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AdminUserItem {
    pub id: Uuid,
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[schema(example = "user")]
    pub role: String,
    pub storage_quota: i64,
    pub storage_used: i64,
    pub file_count: u64,
    /// Downloads of this user's files.
    pub download_count: u64,
    pub created_at: DateTime<Utc>,
}

impl From<AccountUsage> for AdminUserItem {
    fn from(usage: AccountUsage) -> Self {
        let AccountUsage {
            user,
            file_count,
            download_count,
        } = usage;
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
            storage_quota: user.storage_quota,
            storage_used: user.storage_used,
            file_count,
            download_count,
            created_at: user.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AdminUserListResponse {
    pub users: Vec<AdminUserItem>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}
