//! Guest-facing surface (C7, §7): the three token-acquisition paths plus a
//! single authenticated self-view endpoint. Responses never leak the
//! owning server name, raw credentials, or exact interaction counters —
//! [`mask_guest_bot`] is the one seam every guest response passes through.

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Json;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/guest/session-proof", post(session_proof))
        .route("/guest/otp/request", post(request_otp))
        .route("/guest/otp/verify", post(verify_otp))
        .route("/guest/credentials", post(rotate_credentials))
        .route("/guest/me", get(me))
}

#[derive(Serialize)]
struct TokenResponse {
    token: String,
}

async fn session_proof(State(state): State<AppState>, body: Bytes) -> Result<Json<TokenResponse>, ApiError> {
    let token = state.guest_auth.session_proof(&body).await.map_err(ApiError::from)?;
    Ok(Json(TokenResponse { token }))
}

#[derive(Deserialize)]
struct OtpRequest {
    phone: String,
}

async fn request_otp(State(state): State<AppState>, Json(req): Json<OtpRequest>) -> Result<StatusCode, ApiError> {
    state.guest_auth.request_otp(&req.phone).await.map_err(ApiError::from)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
struct OtpVerifyRequest {
    phone: String,
    code: String,
}

async fn verify_otp(State(state): State<AppState>, Json(req): Json<OtpVerifyRequest>) -> Result<Json<TokenResponse>, ApiError> {
    let token = state.guest_auth.verify_otp(&req.phone, &req.code).map_err(ApiError::from)?;
    Ok(Json(TokenResponse { token }))
}

struct GuestBearer(String);

impl<S> axum::extract::FromRequestParts<S> for GuestBearer
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut axum::http::request::Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or((StatusCode::UNAUTHORIZED, "missing bearer token"))?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or((StatusCode::UNAUTHORIZED, "malformed authorization header"))?;
        Ok(GuestBearer(token.to_string()))
    }
}

async fn rotate_credentials(State(state): State<AppState>, bearer: GuestBearer, body: Bytes) -> Result<StatusCode, ApiError> {
    state
        .guest_auth
        .rotate_credentials(&bearer.0, &body)
        .await
        .map_err(ApiError::from)?;
    Ok(StatusCode::NO_CONTENT)
}

/// A guest's own bot, stripped of the owning server name, raw credentials,
/// and exact interaction counters (bucketed instead of exact, per §7).
#[derive(Serialize)]
struct GuestBotView {
    id: String,
    name: String,
    status: wafleet_registry::BotStatus,
    approval_status: wafleet_registry::ApprovalStatus,
    credential_verified: bool,
    activity_level: &'static str,
}

fn mask_guest_bot(bot: &wafleet_registry::BotInstance) -> GuestBotView {
    GuestBotView {
        id: bot.id.clone(),
        name: bot.name.clone(),
        status: bot.status,
        approval_status: bot.approval_status,
        credential_verified: bot.credential_verified,
        activity_level: bucket_activity(bot.messages_count),
    }
}

fn bucket_activity(messages_count: i64) -> &'static str {
    match messages_count {
        0 => "none",
        1..=99 => "low",
        100..=999 => "moderate",
        _ => "high",
    }
}

async fn me(State(state): State<AppState>, bearer: GuestBearer) -> Result<Json<GuestBotView>, ApiError> {
    let claims = state.guest_auth.verify_token(&bearer.0).map_err(ApiError::from)?;
    let bot = state
        .registry
        .get_bot(&state.tenancy, &claims.bot_id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::NotFound("bot not found".into()))?;
    Ok(Json(mask_guest_bot(&bot)))
}
