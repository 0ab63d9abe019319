use axum::{
    Json,
    extract::{Query, State},
};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::admin::{
    AdminFileItem, AdminFileListQuery, AdminFileListResponse, AdminUserItem, AdminUserListQuery,
    AdminUserListResponse,
};
use crate::models::shared::page_params;
use crate::services::{accounts, downloads};
use crate::services::file_catalog::FileCatalog;
use crate::services::stats::{self, SystemStats};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/stats",
    tag = "Admin",
    operation_id = "getStats",
    summary = "System-wide statistics",
    description = "Counts, storage totals and deduplication savings computed from the database.",
    responses(
        (status = 200, description = "Statistics", body = SystemStats),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not an admin (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn get_stats(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<SystemStats>, AppError> {
    auth_user.require_admin()?;
    Ok(Json(stats::collect(&state.db).await?))
}

#[utoipa::path(
    get,
    path = "/files",
    tag = "Admin",
    operation_id = "listAllFiles",
    summary = "List every user's files",
    params(AdminFileListQuery),
    responses(
        (status = 200, description = "One page of files, newest first", body = AdminFileListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not an admin (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = %auth_user.user_id))]
pub async fn list_all_files(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<AdminFileListQuery>,
) -> Result<Json<AdminFileListResponse>, AppError> {
    auth_user.require_admin()?;

    let (page, page_size) = page_params(query.page, query.page_size);
    let result = FileCatalog::new(&state.db)
        .list_all(query.search.as_deref(), page, page_size)
        .await?;

    let ids: Vec<_> = result.items.iter().map(|(f, _)| f.id).collect();
    let counts = downloads::count_by_file(&state.db, &ids).await?;

    let files = result
        .items
        .into_iter()
        .map(|(f, owner)| AdminFileItem {
            download_count: counts.get(&f.id).copied().unwrap_or(0),
            owner_email: owner.map(|u| u.email).unwrap_or_default(),
            id: f.id,
            name: f.name,
            mime_type: f.mime_type,
            size: f.size,
            is_public: f.is_public,
            file_content_id: f.file_content_id,
            user_id: f.user_id,
            created_at: f.created_at,
        })
        .collect();

    Ok(Json(AdminFileListResponse {
        files,
        total: result.total,
        page,
        page_size,
    }))
}

#[utoipa::path(
    get,
    path = "/users",
    tag = "Admin",
    operation_id = "listUsers",
    summary = "List users with usage",
    description = "Quota, usage, file count and download count per user, newest accounts first.",
    params(AdminUserListQuery),
    responses(
        (status = 200, description = "One page of users", body = AdminUserListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not an admin (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = %auth_user.user_id))]
pub async fn list_users(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<AdminUserListQuery>,
) -> Result<Json<AdminUserListResponse>, AppError> {
    auth_user.require_admin()?;

    let (page, page_size) = page_params(query.page, query.page_size);
    let result = accounts::list_accounts(&state.db, query.search.as_deref(), page, page_size).await?;

    Ok(Json(AdminUserListResponse {
        users: result.items.into_iter().map(AdminUserItem::from).collect(),
        total: result.total,
        page,
        page_size,
    }))
}
