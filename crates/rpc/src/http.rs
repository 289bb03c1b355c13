//! HTTP plane of the cross-tenancy RPC boundary: `/internal/tenants/bots/*`.
//!
//! Every handler authenticates the caller against the Server catalog's
//! record of the source tenancy's shared secret, dispatches into the local
//! registry/supervisor as if the request originated locally, and logs a
//! cross-tenancy Activity on success.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::post;
use axum::Router;
use serde::{Deserialize, Serialize};
use wafleet_registry::{NewBotFields, RegistryStore};
use wafleet_supervisor::Supervisor;

use crate::error::Error;
use crate::token::{self, RpcClaims};

#[derive(Clone)]
pub struct RpcState {
    pub tenancy: String,
    pub registry: RegistryStore,
    pub supervisor: Arc<Supervisor>,
}

pub fn router(state: RpcState) -> Router {
    Router::new()
        .route("/internal/tenants/bots/health", post(health))
        .route("/internal/tenants/bots/create", post(create))
        .route("/internal/tenants/bots/update", post(update))
        .route("/internal/tenants/bots/credentials", post(credentials))
        .route("/internal/tenants/bots/lifecycle", post(lifecycle))
        .route("/internal/tenants/bots/status", post(status))
        .with_state(state)
}

#[derive(Serialize)]
struct Envelope<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn ok<T: Serialize>(data: T) -> Response {
    Json(Envelope {
        success: true,
        data: Some(data),
        message: None,
        error: None,
    })
    .into_response()
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match self {
            Self::UnknownSource | Self::BadSignature | Self::Expired => StatusCode::UNAUTHORIZED,
            Self::WrongAudience => StatusCode::FORBIDDEN,
            Self::Registry(wafleet_registry::Error::BotNotFound(_) | wafleet_registry::Error::ServerNotFound(_)) => {
                StatusCode::NOT_FOUND
            },
            Self::Registry(_) | Self::Message(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Envelope::<()> {
            success: false,
            data: None,
            message: None,
            error: Some(self.to_string()),
        };
        (status, Json(body)).into_response()
    }
}

/// Validates `X-Source-Server`, `X-Target-Server`, and the bearer token
/// against the source server's catalog-recorded shared secret.
async fn authenticate(state: &RpcState, headers: &HeaderMap) -> Result<RpcClaims, Error> {
    let target = header_str(headers, "x-target-server").ok_or(Error::BadSignature)?;
    if target != state.tenancy {
        return Err(Error::WrongAudience);
    }
    let source = header_str(headers, "x-source-server").ok_or(Error::BadSignature)?;

    let server = state
        .registry
        .get_server(source)
        .await?
        .ok_or(Error::UnknownSource)?;
    let secret = server.shared_secret.as_deref().ok_or(Error::UnknownSource)?;

    let token = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(Error::BadSignature)?;

    let claims = token::verify(token, secret, &state.tenancy, chrono::Utc::now())?;
    if claims.iss != source {
        return Err(Error::BadSignature);
    }
    Ok(claims)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

async fn health(State(state): State<RpcState>, headers: HeaderMap) -> Result<Response, Error> {
    authenticate(&state, &headers).await?;
    Ok(ok(serde_json::json!({ "tenancy": state.tenancy })))
}

#[derive(Deserialize)]
struct CreatePayload {
    phone_number: String,
    name: String,
    credentials: Option<String>,
    #[serde(default)]
    credential_verified: bool,
    #[serde(default)]
    is_guest: bool,
    #[serde(default)]
    auto_start: bool,
}

async fn create(
    State(state): State<RpcState>,
    headers: HeaderMap,
    Json(payload): Json<CreatePayload>,
) -> Result<Response, Error> {
    let claims = authenticate(&state, &headers).await?;

    let outcome = state
        .registry
        .create_cross_server_registration(
            &payload.phone_number,
            &state.tenancy,
            NewBotFields {
                name: payload.name,
                credentials: payload.credentials,
                credential_verified: payload.credential_verified,
                is_guest: payload.is_guest,
                auto_start: payload.auto_start,
            },
        )
        .await?;

    match outcome {
        wafleet_registry::RegistrationOutcome::Success(bot) => {
            state
                .registry
                .create_cross_tenancy_activity(
                    &state.tenancy,
                    &claims.iss,
                    "cross_tenancy_create",
                    "bot created via cross-tenancy RPC",
                    Some(&bot.id),
                )
                .await?;
            Ok(ok(bot))
        },
        wafleet_registry::RegistrationOutcome::AlreadyRegisteredTo(tenancy) => Ok((
            StatusCode::BAD_REQUEST,
            Json(Envelope::<()> {
                success: false,
                data: None,
                message: None,
                error: Some(format!("phone already registered to {tenancy}")),
            }),
        )
            .into_response()),
        wafleet_registry::RegistrationOutcome::CapacityFull => Ok((
            StatusCode::BAD_REQUEST,
            Json(Envelope::<()> {
                success: false,
                data: None,
                message: None,
                error: Some(format!("{} is full", state.tenancy)),
            }),
        )
            .into_response()),
    }
}

#[derive(Deserialize)]
struct UpdatePayload {
    bot_id: String,
    credentials: Option<String>,
    #[serde(default)]
    credential_verified: bool,
}

async fn update(
    State(state): State<RpcState>,
    headers: HeaderMap,
    Json(payload): Json<UpdatePayload>,
) -> Result<Response, Error> {
    let claims = authenticate(&state, &headers).await?;

    state
        .registry
        .update_bot_on_server(
            &state.tenancy,
            &payload.bot_id,
            payload.credentials.as_deref(),
            payload.credential_verified,
        )
        .await?;
    state
        .registry
        .create_cross_tenancy_activity(
            &state.tenancy,
            &claims.iss,
            "cross_tenancy_update",
            "bot updated via cross-tenancy RPC",
            Some(&payload.bot_id),
        )
        .await?;
    Ok(ok(serde_json::json!({ "botId": payload.bot_id })))
}

#[derive(Deserialize)]
struct CredentialsPayload {
    bot_id: String,
    credentials: String,
}

async fn credentials(
    State(state): State<RpcState>,
    headers: HeaderMap,
    Json(payload): Json<CredentialsPayload>,
) -> Result<Response, Error> {
    let claims = authenticate(&state, &headers).await?;

    state
        .registry
        .update_bot_on_server(&state.tenancy, &payload.bot_id, Some(&payload.credentials), true)
        .await?;
    state
        .registry
        .create_cross_tenancy_activity(
            &state.tenancy,
            &claims.iss,
            "cross_tenancy_credentials",
            "credentials rotated via cross-tenancy RPC",
            Some(&payload.bot_id),
        )
        .await?;

    if let Err(err) = state.supervisor.restart_bot(&payload.bot_id).await {
        tracing::warn!(bot_id = %payload.bot_id, %err, "restart after cross-tenancy credential rotation failed");
    }

    Ok(ok(serde_json::json!({ "botId": payload.bot_id })))
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum LifecycleAction {
    Start,
    Stop,
    Restart,
}

#[derive(Deserialize)]
struct LifecyclePayload {
    bot_id: String,
    action: LifecycleAction,
}

async fn lifecycle(
    State(state): State<RpcState>,
    headers: HeaderMap,
    Json(payload): Json<LifecyclePayload>,
) -> Result<Response, Error> {
    let claims = authenticate(&state, &headers).await?;

    let (verb, result) = match payload.action {
        LifecycleAction::Start => ("start", state.supervisor.start_bot(&payload.bot_id).await),
        LifecycleAction::Stop => ("stop", state.supervisor.stop_bot(&payload.bot_id, true).await),
        LifecycleAction::Restart => ("restart", state.supervisor.restart_bot(&payload.bot_id).await),
    };
    result.map_err(|e| Error::Message(e.to_string()))?;

    state
        .registry
        .create_cross_tenancy_activity(
            &state.tenancy,
            &claims.iss,
            "cross_tenancy_lifecycle",
            &format!("lifecycle {verb} via cross-tenancy RPC"),
            Some(&payload.bot_id),
        )
        .await?;
    Ok(ok(serde_json::json!({ "botId": payload.bot_id, "action": verb })))
}

#[derive(Deserialize)]
struct StatusPayload {
    bot_id: String,
}

async fn status(
    State(state): State<RpcState>,
    headers: HeaderMap,
    Json(payload): Json<StatusPayload>,
) -> Result<Response, Error> {
    authenticate(&state, &headers).await?;
    let bot = state
        .registry
        .get_bot_on_server(&state.tenancy, &payload.bot_id)
        .await?
        .ok_or_else(|| Error::Message(format!("bot {} not found", payload.bot_id)))?;
    Ok(ok(bot))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use sqlx::SqlitePool;
    use tower::ServiceExt;
    use wafleet_registry::Server;
    use wafleet_session::{SessionEventSink, SessionStatus, SessionWorker, SessionWorkerFactory};

    use super::*;

    struct NoopWorker;

    #[async_trait]
    impl SessionWorker for NoopWorker {
        async fn start(&mut self) -> wafleet_session::Result<()> {
            Ok(())
        }

        async fn stop(&mut self, _preserve_credentials: bool) -> wafleet_session::Result<()> {
            Ok(())
        }

        async fn send_direct_message(&self, _jid: &str, _text: &str) -> wafleet_session::Result<()> {
            Ok(())
        }

        fn status(&self) -> SessionStatus {
            SessionStatus::Online
        }
    }

    struct NoopFactory;

    impl SessionWorkerFactory for NoopFactory {
        fn build(&self, _bot_id: &str, _credentials_dir: &Path, _sink: Arc<dyn SessionEventSink>) -> Box<dyn SessionWorker> {
            Box::new(NoopWorker)
        }
    }

    async fn test_state(tenancy: &str, secret: Option<&str>) -> RpcState {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        wafleet_registry::run_migrations(&pool).await.unwrap();
        let registry = RegistryStore::new(pool);
        registry
            .upsert_server(&Server {
                name: "Source1".into(),
                max_bot_count: 10,
                current_bot_count: 0,
                status: "active".into(),
                description: None,
                url: None,
                shared_secret: secret.map(str::to_string),
            })
            .await
            .unwrap();
        registry
            .upsert_server(&Server {
                name: tenancy.to_string(),
                max_bot_count: 10,
                current_bot_count: 0,
                status: "active".into(),
                description: None,
                url: None,
                shared_secret: None,
            })
            .await
            .unwrap();

        let supervisor = Arc::new(Supervisor::new(
            tenancy,
            registry.clone(),
            Arc::new(NoopFactory),
            Arc::new(wafleet_supervisor::NullBroadcaster),
            std::env::temp_dir().join("wafleet-rpc-test"),
        ));

        RpcState {
            tenancy: tenancy.to_string(),
            registry,
            supervisor,
        }
    }

    #[tokio::test]
    async fn health_requires_valid_signature() {
        let state = test_state("Target1", Some("shared-secret")).await;
        let app = router(state.clone());

        let claims = RpcClaims::new("Source1", "Target1", chrono::Utc::now(), 30, serde_json::json!({}));
        let token = token::sign(&claims, "shared-secret").unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/internal/tenants/bots/health")
                    .header("x-source-server", "Source1")
                    .header("x-target-server", "Target1")
                    .header("authorization", format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn health_rejects_bad_signature() {
        let state = test_state("Target1", Some("shared-secret")).await;
        let app = router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/internal/tenants/bots/health")
                    .header("x-source-server", "Source1")
                    .header("x-target-server", "Target1")
                    .header("authorization", "Bearer garbage")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn health_rejects_missing_source_secret() {
        let state = test_state("Target1", None).await;
        let app = router(state);

        let claims = RpcClaims::new("Source1", "Target1", chrono::Utc::now(), 30, serde_json::json!({}));
        let token = token::sign(&claims, "anything").unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/internal/tenants/bots/health")
                    .header("x-source-server", "Source1")
                    .header("x-target-server", "Target1")
                    .header("authorization", format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
