//! HTTP gateway for StockClaw.
//!
//! Two endpoints, matching what the dashboard expects:
//!
//! - `GET /health`: liveness plus the active model
//! - `POST /chat`: `{"query": ...}` in, `{"response": ...}` out
//!
//! Built on Axum. Each request runs its own agent session.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use stockclaw_agent::AgentLoop;
use stockclaw_config::AppConfig;
use stockclaw_core::error::Error;
use stockclaw_core::event::EventBus;

/// Maximum accepted request body.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub agent: Arc<AgentLoop>,
    pub request_timeout: Duration,
}

pub type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/chat", post(chat_handler))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway HTTP server.
///
/// Provider, tools and event bus are built once and shared by every request.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let providers = stockclaw_providers::build_from_config(&config);
    let provider = providers.default_provider().ok_or_else(|| Error::Config {
        message: format!("provider '{}' is not available", config.default_provider),
    })?;
    let tools = Arc::new(stockclaw_tools::build_registry(&config)?);
    let event_bus = Arc::new(EventBus::default());

    let agent = AgentLoop::from_config(&config, provider, tools, event_bus);
    let state = Arc::new(GatewayState {
        agent: Arc::new(agent),
        request_timeout: Duration::from_secs(config.gateway.request_timeout_secs),
    });

    let app = build_router(state);

    info!(addr = %addr, model = %config.default_model, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: String,
    model: String,
    version: &'static str,
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "online",
        service: state.agent.persona().name.clone(),
        model: state.agent.model().to_string(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Deserialize)]
struct ChatRequest {
    query: String,
}

#[derive(Serialize)]
struct ChatResponse {
    response: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

/// HTTP status for an invocation failure.
fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        Error::Provider(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn chat_handler(
    State(state): State<SharedState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(p) => p,
        Err(rejection) => {
            warn!(error = %rejection, "Rejected chat request body");
            return error_response(rejection.status(), rejection.body_text());
        }
    };

    let query = payload.query.trim();
    if query.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "query must not be empty");
    }

    info!(query_len = query.len(), "Chat request received");

    match state.agent.run_with_timeout(query, state.request_timeout).await {
        Ok(response) => Json(ChatResponse { response }).into_response(),
        Err(e) => {
            error!(error = %e, "Agent invocation failed");
            error_response(status_for(&e), e.to_string())
        }
    }
}
