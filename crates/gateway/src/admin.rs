//! Admin surface (§6.2): operator login, fleet inspection, and lifecycle
//! control. Every handler but `login` requires an [`AdminSession`].

use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordVerifier};
use axum::Json;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Router;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use wafleet_auth::AdminSession;
use wafleet_lifecycle::{BatchAction, BatchItem};
use wafleet_registry::NewBotFields;

use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/login", post(login))
        .route("/admin/bots", get(list_bots).post(create_bot))
        .route("/admin/bots/{bot_id}", get(get_bot).delete(delete_bot))
        .route("/admin/bots/{bot_id}/approve", post(approve_bot))
        .route("/admin/bots/{bot_id}/revoke", post(revoke_bot))
        .route("/admin/bots/{bot_id}/reject", post(reject_bot))
        .route("/admin/bots/{bot_id}/start", post(start_bot))
        .route("/admin/bots/{bot_id}/stop", post(stop_bot))
        .route("/admin/bots/batch", post(batch_operate))
        .route("/admin/servers", get(list_servers))
}

#[derive(Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize)]
struct LoginResponse {
    token: String,
}

async fn login(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> Result<Json<LoginResponse>, ApiError> {
    if req.username != state.admin_username {
        return Err(ApiError::Auth("invalid username or password".into()));
    }
    let hash = PasswordHash::new(state.admin_password_hash.expose_secret())
        .map_err(|e| ApiError::Internal(format!("stored admin password hash is malformed: {e}")))?;
    Argon2::default()
        .verify_password(req.password.as_bytes(), &hash)
        .map_err(|_| ApiError::Auth("invalid username or password".into()))?;

    let token = wafleet_auth::issue_admin_token(&req.username, chrono::Utc::now(), state.admin_secret.0.expose_secret())
        .map_err(ApiError::from)?;
    Ok(Json(LoginResponse { token }))
}

async fn list_bots(_session: AdminSession, State(state): State<AppState>) -> Result<Json<Vec<wafleet_registry::BotInstance>>, ApiError> {
    let bots = state.registry.list_bots(&state.tenancy).await.map_err(ApiError::from)?;
    Ok(Json(bots))
}

async fn get_bot(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(bot_id): Path<String>,
) -> Result<Json<wafleet_registry::BotInstance>, ApiError> {
    let bot = state
        .registry
        .get_bot(&state.tenancy, &bot_id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::NotFound(format!("bot {bot_id} not found")))?;
    Ok(Json(bot))
}

#[derive(Deserialize)]
struct CreateBotRequest {
    phone_number: String,
    name: String,
    credentials: Option<String>,
    #[serde(default)]
    credential_verified: bool,
    #[serde(default)]
    is_guest: bool,
    #[serde(default)]
    auto_start: bool,
    selected_server: Option<String>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum CreateBotResponse {
    Registered(wafleet_registry::BotInstance),
    RegisteredElsewhere { bot: wafleet_registry::BotInstance, tenancy: String },
}

async fn create_bot(
    _session: AdminSession,
    State(state): State<AppState>,
    Json(req): Json<CreateBotRequest>,
) -> Result<Json<CreateBotResponse>, ApiError> {
    let outcome = state
        .placement
        .place(
            &req.phone_number,
            req.selected_server.as_deref(),
            true,
            &state.tenancy,
            NewBotFields {
                name: req.name,
                credentials: req.credentials,
                credential_verified: req.credential_verified,
                is_guest: req.is_guest,
                auto_start: req.auto_start,
            },
        )
        .await
        .map_err(ApiError::from)?;

    let response = match outcome {
        wafleet_placement::PlacementOutcome::Registered(bot) => {
            state.supervisor.register_new_bot(&bot.id).await.map_err(ApiError::from)?;
            if bot.is_guest {
                state.lifecycle.maybe_auto_approve(&bot).await.map_err(ApiError::from)?;
            }
            CreateBotResponse::Registered(bot)
        },
        wafleet_placement::PlacementOutcome::RegisteredElsewhere { bot, tenancy } => {
            CreateBotResponse::RegisteredElsewhere { bot, tenancy }
        },
    };
    Ok(Json(response))
}

async fn delete_bot(_session: AdminSession, State(state): State<AppState>, Path(bot_id): Path<String>) -> Result<(), ApiError> {
    state.lifecycle.delete(&bot_id).await.map_err(ApiError::from)
}

#[derive(Deserialize, Default)]
struct ApproveRequest {
    expiration_months: Option<i64>,
    target_tenancy: Option<String>,
}

async fn approve_bot(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(bot_id): Path<String>,
    body: Option<Json<ApproveRequest>>,
) -> Result<(), ApiError> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    state
        .lifecycle
        .approve(&bot_id, req.expiration_months, req.target_tenancy.as_deref())
        .await
        .map_err(ApiError::from)
}

async fn revoke_bot(_session: AdminSession, State(state): State<AppState>, Path(bot_id): Path<String>) -> Result<(), ApiError> {
    state.lifecycle.revoke(&bot_id).await.map_err(ApiError::from)
}

async fn reject_bot(_session: AdminSession, State(state): State<AppState>, Path(bot_id): Path<String>) -> Result<(), ApiError> {
    state.lifecycle.reject(&bot_id).await.map_err(ApiError::from)
}

async fn start_bot(_session: AdminSession, State(state): State<AppState>, Path(bot_id): Path<String>) -> Result<(), ApiError> {
    state.lifecycle.start(&bot_id).await.map_err(ApiError::from)
}

async fn stop_bot(_session: AdminSession, State(state): State<AppState>, Path(bot_id): Path<String>) -> Result<(), ApiError> {
    state.lifecycle.stop(&bot_id).await.map_err(ApiError::from)
}

#[derive(Deserialize)]
struct BatchRequestItem {
    bot_id: String,
    tenancy: String,
    action: BatchActionRequest,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum BatchActionRequest {
    Start,
    Stop,
    Approve { expiration_months: Option<i64> },
    Revoke,
    Reject,
    Delete,
    Migrate { target: String },
}

#[derive(Serialize)]
struct BatchResponseItem {
    bot_id: String,
    tenancy: String,
    ok: bool,
    error: Option<String>,
}

async fn batch_operate(
    _session: AdminSession,
    State(state): State<AppState>,
    Json(items): Json<Vec<BatchRequestItem>>,
) -> Json<Vec<BatchResponseItem>> {
    let items = items
        .into_iter()
        .map(|item| BatchItem {
            bot_id: item.bot_id,
            tenancy: item.tenancy,
            action: match item.action {
                BatchActionRequest::Start => BatchAction::Start,
                BatchActionRequest::Stop => BatchAction::Stop,
                BatchActionRequest::Approve { expiration_months } => BatchAction::Approve { expiration_months },
                BatchActionRequest::Revoke => BatchAction::Revoke,
                BatchActionRequest::Reject => BatchAction::Reject,
                BatchActionRequest::Delete => BatchAction::Delete,
                BatchActionRequest::Migrate { target } => BatchAction::Migrate { target },
            },
        })
        .collect();

    let outcomes = state.lifecycle.batch_operate(items).await;
    Json(
        outcomes
            .into_iter()
            .map(|o| BatchResponseItem {
                bot_id: o.bot_id,
                tenancy: o.tenancy,
                ok: o.result.is_ok(),
                error: o.result.err(),
            })
            .collect(),
    )
}

async fn list_servers(_session: AdminSession, State(state): State<AppState>) -> Result<Json<Vec<wafleet_registry::Server>>, ApiError> {
    Ok(Json(state.registry.list_servers().await.map_err(ApiError::from)?))
}
