use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::file_share;
use crate::models::file::FileResponse;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateShareRequest {
    /// Public shares can be redeemed without signing in.
    #[serde(default)]
    pub is_public: bool,
    /// Omit for a share that never expires.
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ShareResponse {
    pub id: Uuid,
    pub file_id: Uuid,
    #[schema(example = "0192f3c1-4be0c2a97f1d9e33")]
    pub share_token: String,
    pub is_public: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<file_share::Model> for ShareResponse {
    fn from(model: file_share::Model) -> Self {
        Self {
            id: model.id,
            file_id: model.file_id,
            share_token: model.share_token,
            is_public: model.is_public,
            expires_at: model.expires_at,
            created_at: model.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SharedFileResponse {
    pub share: ShareResponse,
    pub file: FileResponse,
}
