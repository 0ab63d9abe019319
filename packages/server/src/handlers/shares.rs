use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use tracing::instrument;

use crate::entity::{file, file_share};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{AuthUser, MaybeAuthUser};
use crate::extractors::client::ClientMeta;
use crate::extractors::json::AppJson;
use crate::handlers::files::{parse_id, stream_file};
use crate::models::file::FileResponse;
use crate::models::share::{CreateShareRequest, ShareResponse, SharedFileResponse};
use crate::services::file_catalog::{FileCatalog, can_read};
use crate::services::shares::ShareService;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/{id}/share",
    tag = "Shares",
    operation_id = "shareFile",
    summary = "Create a share link for a file",
    params(("id" = String, Path, description = "File ID (UUID)")),
    request_body = CreateShareRequest,
    responses(
        (status = 201, description = "Share created", body = ShareResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.user_id, file_id = %id))]
pub async fn create_share(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<CreateShareRequest>,
) -> Result<impl IntoResponse, AppError> {
    let file = FileCatalog::new(&state.db)
        .find_by_id(parse_id(&id)?)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".into()))?;
    if file.user_id != auth_user.user_id {
        return Err(AppError::PermissionDenied);
    }

    if let Some(expires_at) = payload.expires_at
        && expires_at <= Utc::now()
    {
        return Err(AppError::Validation(
            "expires_at must be in the future".into(),
        ));
    }

    let share = ShareService::new(&state.db)
        .create(file.id, payload.is_public, payload.expires_at)
        .await?;

    Ok((StatusCode::CREATED, Json(ShareResponse::from(share))))
}

/// Resolve a token to an active share the caller may use. A private share
/// only resolves for callers who could read the file directly.
async fn redeem(
    state: &AppState,
    token: &str,
    caller: &MaybeAuthUser,
) -> Result<(file_share::Model, file::Model), AppError> {
    let (share, file) = ShareService::new(&state.db)
        .find_active(token)
        .await?
        .ok_or_else(|| AppError::NotFound("Share not found".into()))?;

    if !share.is_public {
        let viewer = caller.0.as_ref().ok_or(AppError::TokenMissing)?;
        if !can_read(&file, viewer.user_id) {
            return Err(AppError::PermissionDenied);
        }
    }
    Ok((share, file))
}

#[utoipa::path(
    get,
    path = "/{token}",
    tag = "Shares",
    operation_id = "getShare",
    summary = "Get a shared file's metadata",
    description = "Public shares need no authentication. Expired shares are reported as not found.",
    params(("token" = String, Path, description = "Share token")),
    responses(
        (status = 200, description = "Share and file metadata", body = SharedFileResponse),
        (status = 401, description = "Private share without a token (TOKEN_MISSING)", body = ErrorBody),
        (status = 403, description = "Private share of a file the caller cannot read (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown or expired share (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, caller))]
pub async fn get_share(
    caller: MaybeAuthUser,
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<SharedFileResponse>, AppError> {
    let (share, file) = redeem(&state, &token, &caller).await?;
    Ok(Json(SharedFileResponse {
        share: ShareResponse::from(share),
        file: FileResponse::from(file),
    }))
}

#[utoipa::path(
    get,
    path = "/{token}/download",
    tag = "Shares",
    operation_id = "downloadShare",
    summary = "Download a shared file",
    params(("token" = String, Path, description = "Share token")),
    responses(
        (status = 200, description = "File content"),
        (status = 304, description = "Not Modified (ETag match)"),
        (status = 401, description = "Private share without a token (TOKEN_MISSING)", body = ErrorBody),
        (status = 403, description = "Private share of a file the caller cannot read (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown or expired share (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Stored bytes missing (CONTENT_MISSING)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, caller, client, headers))]
pub async fn download_share(
    caller: MaybeAuthUser,
    State(state): State<AppState>,
    Path(token): Path<String>,
    client: ClientMeta,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let (_, file) = redeem(&state, &token, &caller).await?;
    let user_id = caller.0.map(|u| u.user_id);
    stream_file(&state, &file, &headers, user_id, client).await
}
