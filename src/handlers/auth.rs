//! Authentication HTTP handlers
//!
//! Endpoints for wallet-based authentication.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use validator::Validate;

use crate::error::ApiResult;
use crate::models::{ChallengeResponse, NonceQuery, VerifyRequest, VerifyResponse};
use crate::state::AppState;

/// GET /api/auth/nonce?address=... - Issue a nonce for wallet authentication
pub async fn get_nonce(
    State(state): State<AppState>,
    query: Result<Query<NonceQuery>, QueryRejection>,
) -> ApiResult<Json<ChallengeResponse>> {
    let Query(query) = query?;

    let challenge = state
        .auth_service
        .request_challenge(&query.address)
        .await?;

    Ok(Json(challenge))
}

/// POST /api/auth/verify - Verify signed challenge and issue a session token
pub async fn verify_signature(
    State(state): State<AppState>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> ApiResult<Json<VerifyResponse>> {
    let Json(req) = payload?;
    req.validate()?;

    let response = state
        .auth_service
        .verify_and_issue(&req.address, &req.message, &req.signature)
        .await?;

    Ok(Json(response))
}
