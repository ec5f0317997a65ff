//! Protected account handlers

use axum::{extract::State, Json};

use super::AuthenticatedWallet;
use crate::auth::AuthError;
use crate::error::{ApiError, ApiResult};
use crate::models::UserResponse;
use crate::state::AppState;

/// GET /api/user - Account of the authenticated wallet
pub async fn get_current_user(
    State(state): State<AppState>,
    wallet: AuthenticatedWallet,
) -> ApiResult<Json<UserResponse>> {
    let account = state
        .auth_service
        .get_account(&wallet.address)
        .await
        .map_err(|e| match e {
            AuthError::UnknownAddress => ApiError::NotFound("Account not found".to_string()),
            other => other.into(),
        })?;

    Ok(Json(account.into()))
}
