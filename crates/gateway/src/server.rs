//! HTTP server assembly: admin routes, guest routes, the cross-tenancy RPC
//! router, health checks, and the middleware stack every request passes
//! through before reaching a handler.

use std::net::SocketAddr;

use axum::Router;
use axum::http::{HeaderValue, header};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Json;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::sensitive_headers::SetSensitiveHeadersLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// 1 MiB global request body limit: ample for JSON payloads and a full
/// WhatsApp multi-device credential blob, small enough to bound abuse.
const REQUEST_BODY_LIMIT: usize = 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    // The RPC router already serves its own absolute paths under
    // `/internal/tenants/bots/*` (the authenticated peer-to-peer plane);
    // it is merged in directly rather than nested under a prefix.
    let rpc_routes = wafleet_rpc::router(state.rpc.clone());
    let routes = Router::new()
        .route("/healthz", get(healthz))
        .merge(crate::admin::router())
        .merge(crate::guest::router())
        .with_state(state);

    apply_middleware_stack(routes.merge(rpc_routes))
}

/// Unauthenticated liveness probe: no DB round-trip, just "the process is up".
async fn healthz() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

fn build_cors_layer() -> CorsLayer {
    CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
}

/// Layer order (outermost to innermost for requests):
/// 1. `CatchPanicLayer` — converts handler panics into 500s
/// 2. `SetSensitiveHeadersLayer` — marks Authorization as redacted in traces
/// 3. `SetRequestIdLayer` — stamps `x-request-id` before tracing runs
/// 4. `TraceLayer` — structured request/response logging
/// 5. `CorsLayer`
/// 6. `PropagateRequestIdLayer` — copies the request ID onto the response
/// 7. Security response headers
/// 8. `RequestBodyLimitLayer` (innermost)
fn apply_middleware_stack(router: Router) -> Router {
    let router = router
        .layer(tower_http::limit::RequestBodyLimitLayer::new(REQUEST_BODY_LIMIT))
        .layer(SetResponseHeaderLayer::overriding(
            header::HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("deny"),
        ))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(build_cors_layer())
        .layer(TraceLayer::new_for_http());

    router
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(SetSensitiveHeadersLayer::new([header::AUTHORIZATION]))
        .layer(CatchPanicLayer::new())
}

/// Binds and serves the router, stopping on Ctrl-C and letting in-flight
/// requests finish. `Supervisor::resume_on_startup` must already have run
/// before this is called so the fleet is live before the port opens.
pub async fn serve(state: AppState, bind: &str, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "gateway listening");
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::warn!("failed to install Ctrl-C handler, shutting down immediately");
        return;
    }
    tracing::info!("received Ctrl-C, shutting down gracefully");
}
