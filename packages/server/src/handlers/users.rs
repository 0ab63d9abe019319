use axum::{Json, extract::State};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::auth::QuotaResponse;
use crate::services::quota_ledger::QuotaLedger;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/me/quota",
    tag = "Users",
    operation_id = "getMyQuota",
    summary = "Get the caller's storage quota",
    responses(
        (status = 200, description = "Quota position", body = QuotaResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn get_quota(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<QuotaResponse>, AppError> {
    let account = QuotaLedger::new(&state.db)
        .get_account(auth_user.user_id)
        .await?;
    Ok(Json(QuotaResponse {
        quota: account.limit_bytes,
        used: account.used_bytes,
        available: account.available_bytes(),
    }))
}
