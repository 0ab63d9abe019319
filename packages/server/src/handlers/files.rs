use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::storage::ContentHash;
use tokio_util::io::ReaderStream;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::file;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::client::ClientMeta;
use crate::extractors::json::AppJson;
use crate::models::file::{
    CheckDuplicateRequest, CheckDuplicateResponse, FileListQuery, FileListResponse, FileResponse,
    UploadResponse,
};
use crate::models::shared::{MessageResponse, page_params};
use crate::services::downloads::{self, Downloader};
use crate::services::file_catalog::{FileCatalog, FileFilter, can_read};
use crate::services::upload::{UploadRequest, UploadService};
use crate::state::AppState;
use crate::utils::filename::{content_disposition, resolve_mime_type};

/// Multipart overhead allowed on top of the configured maximum file size.
const MULTIPART_SLACK: usize = 64 * 1024;

pub fn upload_body_limit(max_upload_size: u64) -> DefaultBodyLimit {
    let max = usize::try_from(max_upload_size).unwrap_or(usize::MAX);
    DefaultBodyLimit::max(max.saturating_add(MULTIPART_SLACK))
}

pub(crate) fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::Validation("Invalid file ID".into()))
}

/// Fetch a file the caller may read. Missing files are `404`, other users'
/// private files `403`.
async fn find_readable(state: &AppState, id: Uuid, viewer: Uuid) -> Result<file::Model, AppError> {
    let file = FileCatalog::new(&state.db)
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".into()))?;
    if !can_read(&file, viewer) {
        return Err(AppError::PermissionDenied);
    }
    Ok(file)
}

fn parse_bool(raw: &str) -> Result<bool, AppError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "false" | "0" | "off" | "no" => Ok(false),
        "true" | "1" | "on" | "yes" => Ok(true),
        other => Err(AppError::Validation(format!(
            "is_public must be a boolean, got '{other}'"
        ))),
    }
}

#[utoipa::path(
    post,
    path = "/upload",
    tag = "Files",
    operation_id = "uploadFile",
    summary = "Upload a file",
    description = "Multipart upload with a required `file` part and `name` field and an optional \
        `is_public` field. Content already stored by anyone is not stored or charged again; \
        the new file simply references it.",
    request_body(content_type = "multipart/form-data", description = "File content and metadata"),
    responses(
        (status = 201, description = "File created", body = UploadResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Quota exceeded (QUOTA_EXCEEDED)", body = ErrorBody),
        (status = 500, description = "Content could not be stored (STORAGE_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = %auth_user.user_id))]
pub async fn upload_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let max_size = state.config.storage.max_upload_size;

    let mut data: Option<Vec<u8>> = None;
    let mut declared_type: Option<String> = None;
    let mut name: Option<String> = None;
    let mut is_public = false;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("file") => {
                if data.is_some() {
                    return Err(AppError::Validation(
                        "Only one 'file' part is allowed".into(),
                    ));
                }
                declared_type = field.content_type().map(str::to_owned);
                let mut buf = Vec::new();
                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
                {
                    if (buf.len() + chunk.len()) as u64 > max_size {
                        return Err(AppError::Validation(format!(
                            "File exceeds maximum size of {max_size} bytes"
                        )));
                    }
                    buf.extend_from_slice(&chunk);
                }
                data = Some(buf);
            }
            Some("name") => {
                name = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::Validation(format!("Failed to read name: {e}")))?,
                );
            }
            Some("is_public") => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read is_public: {e}")))?;
                is_public = parse_bool(&raw)?;
            }
            _ => {}
        }
    }

    let data = data.ok_or_else(|| AppError::Validation("Missing 'file' field".into()))?;
    let name = name.ok_or_else(|| AppError::Validation("Missing 'name' field".into()))?;
    let mime_type = resolve_mime_type(declared_type.as_deref(), name.trim());

    let outcome = UploadService::new(&state.db, &*state.content_store)
        .upload(UploadRequest {
            user_id: auth_user.user_id,
            data,
            name,
            mime_type,
            is_public,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            file: FileResponse::from(outcome.file),
            deduplicated: outcome.deduplicated,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/check-duplicate",
    tag = "Files",
    operation_id = "checkDuplicate",
    summary = "Check whether content is already stored",
    description = "Lets a client skip sending bytes the server already has. Has no side effects.",
    request_body = CheckDuplicateRequest,
    responses(
        (status = 200, description = "Lookup result", body = CheckDuplicateResponse),
        (status = 400, description = "Malformed hash (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.user_id))]
pub async fn check_duplicate(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CheckDuplicateRequest>,
) -> Result<Json<CheckDuplicateResponse>, AppError> {
    let hash = ContentHash::from_hex(&payload.sha256_hash)?;
    let info = UploadService::new(&state.db, &*state.content_store)
        .check_duplicate(&hash)
        .await?;

    Ok(Json(CheckDuplicateResponse {
        is_duplicate: info.is_some(),
        duplicate_info: info.map(Into::into),
    }))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Files",
    operation_id = "listFiles",
    summary = "List the caller's files",
    params(FileListQuery),
    responses(
        (status = 200, description = "One page of files, newest first", body = FileListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = %auth_user.user_id))]
pub async fn list_files(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<FileListQuery>,
) -> Result<Json<FileListResponse>, AppError> {
    let (page, page_size) = page_params(query.page, query.page_size);
    let filter = FileFilter {
        search: query.search,
        mime_type: query.mime_type,
        is_public: query.is_public,
    };

    let result = FileCatalog::new(&state.db)
        .list_for_user(auth_user.user_id, &filter, page, page_size)
        .await?;

    Ok(Json(FileListResponse {
        files: result.items.into_iter().map(FileResponse::from).collect(),
        total: result.total,
        page,
        page_size,
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Files",
    operation_id = "getFile",
    summary = "Get file metadata",
    params(("id" = String, Path, description = "File ID (UUID)")),
    responses(
        (status = 200, description = "File metadata", body = FileResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Private file of another user (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id, file_id = %id))]
pub async fn get_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FileResponse>, AppError> {
    let file = find_readable(&state, parse_id(&id)?, auth_user.user_id).await?;
    Ok(Json(FileResponse::from(file)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Files",
    operation_id = "deleteFile",
    summary = "Delete a file",
    description = "Removes the caller's reference. Stored content shared with other files is \
        kept, and quota usage is not refunded.",
    params(("id" = String, Path, description = "File ID (UUID)")),
    responses(
        (status = 200, description = "File deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id, file_id = %id))]
pub async fn delete_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(&id)?;
    let catalog = FileCatalog::new(&state.db);

    let file = catalog
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".into()))?;
    if file.user_id != auth_user.user_id {
        return Err(AppError::PermissionDenied);
    }

    if !catalog.delete(id, auth_user.user_id).await? {
        return Err(AppError::NotFound("File not found".into()));
    }

    tracing::info!(content_id = %file.file_content_id, "File reference deleted");
    Ok(Json(MessageResponse::new("file deleted")))
}

#[utoipa::path(
    get,
    path = "/{id}/download",
    tag = "Files",
    operation_id = "downloadFile",
    summary = "Download file content",
    description = "Streams the bytes. The ETag is the content hash; a matching If-None-Match \
        yields 304 without a body.",
    params(("id" = String, Path, description = "File ID (UUID)")),
    responses(
        (status = 200, description = "File content"),
        (status = 304, description = "Not Modified (ETag match)"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Private file of another user (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Stored bytes missing (CONTENT_MISSING)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, headers, client), fields(user_id = %auth_user.user_id, file_id = %id))]
pub async fn download_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    client: ClientMeta,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let file = find_readable(&state, parse_id(&id)?, auth_user.user_id).await?;
    stream_file(&state, &file, &headers, Some(auth_user.user_id), client).await
}

/// Whether an `If-None-Match` value (possibly a list) names `etag`.
fn etag_matches(if_none_match: &str, etag: &str) -> bool {
    if_none_match
        .split(',')
        .map(str::trim)
        .any(|candidate| candidate == "*" || candidate.trim_start_matches("W/") == etag)
}

/// Build a streaming download response for `file` and log the transfer.
pub(crate) async fn stream_file(
    state: &AppState,
    file: &file::Model,
    headers: &HeaderMap,
    user_id: Option<Uuid>,
    client: ClientMeta,
) -> Result<Response, AppError> {
    let content = downloads::find_content(&state.db, file).await?;

    let etag_value = format!("\"{}\"", content.sha256_hash);
    if let Some(if_none_match) = headers.get(header::IF_NONE_MATCH)
        && let Ok(val) = if_none_match.to_str()
        && etag_matches(val, &etag_value)
    {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    let reader = downloads::open_reader(&*state.content_store, &content).await?;
    let body = Body::from_stream(ReaderStream::new(reader));

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, &file.mime_type)
        .header(header::CONTENT_LENGTH, content.size.to_string())
        .header(header::CONTENT_DISPOSITION, content_disposition(&file.name))
        .header(header::ETAG, &etag_value)
        .header(header::CACHE_CONTROL, "private, max-age=3600")
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))?;

    downloads::record_download_best_effort(
        &state.db,
        file.id,
        Downloader {
            user_id,
            ip_address: client.ip_address,
            user_agent: client.user_agent,
        },
    )
    .await;

    Ok(response)
}
