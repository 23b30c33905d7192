//! Admin HTTP API
//!
//! Health, status and control endpoints. Every control route goes through
//! [`BotControl`], the same surface the chat commands use.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use devhelper_core::{BotControl, BotState, BotStatus, ConnectivitySummary};
use serde::{Deserialize, Serialize};
use tracing::info;

const DEFAULT_API_DEACTIVATE_REASON: &str = "Deactivated via API";

/// Shared state for admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub control: Arc<dyn BotControl>,
    pub started_at: Instant,
}

impl AdminState {
    pub fn new(control: Arc<dyn BotControl>) -> Self {
        Self { control, started_at: Instant::now() }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformHealth {
    pub status: String,
    pub details: ConnectivitySummary,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthServices {
    pub platform: PlatformHealth,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: String,
    pub time: DateTime<Utc>,
    pub bot_state: BotState,
    pub uptime_seconds: u64,
    pub services: HealthServices,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlResponse {
    pub success: bool,
    pub message: String,
    pub state: BotState,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeactivateRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

/// Build the admin router.
pub fn admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/bot-status", get(bot_status))
        .route("/reset-bot", get(reset_bot).post(reset_bot))
        .route("/activate", post(activate))
        .route("/deactivate", post(deactivate))
        .with_state(state)
}

async fn root() -> &'static str {
    "DevHelper bot is running"
}

/// `GET /health`: UP only while the bot is Active and the session probes healthy.
async fn health(State(state): State<AdminState>) -> impl IntoResponse {
    let status: BotStatus = state.control.status().await;
    let connected = state.control.check_connection().await;
    let up = connected && status.state == BotState::Active;

    let report = HealthReport {
        status: if up { "UP" } else { "DOWN" }.into(),
        time: Utc::now(),
        bot_state: status.state,
        uptime_seconds: state.started_at.elapsed().as_secs(),
        services: HealthServices {
            platform: PlatformHealth {
                status: if connected { "UP" } else { "DOWN" }.into(),
                details: status.connectivity,
            },
        },
    };

    let code = if up { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (code, Json(report))
}

async fn bot_status(State(state): State<AdminState>) -> Json<BotStatus> {
    Json(state.control.status().await)
}

async fn reset_bot(State(state): State<AdminState>) -> impl IntoResponse {
    info!("[AdminApi] Reset requested");
    let success = state.control.reset_bot().await;
    let status = state.control.status().await;
    let message = if success {
        "Bot reset successfully".to_string()
    } else {
        format!("Bot reset failed: {}", status.reason)
    };
    control_response(success, message, status.state)
}

async fn activate(State(state): State<AdminState>) -> impl IntoResponse {
    info!("[AdminApi] Activation requested");
    let success = state.control.activate_bot().await;
    let status = state.control.status().await;
    let message = if success {
        "Bot activated".to_string()
    } else {
        format!("Activation failed: {}", status.reason)
    };
    control_response(success, message, status.state)
}

async fn deactivate(
    State(state): State<AdminState>,
    body: Option<Json<DeactivateRequest>>,
) -> impl IntoResponse {
    let reason = body
        .and_then(|Json(req)| req.reason)
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_API_DEACTIVATE_REASON.to_string());
    info!(%reason, "[AdminApi] Deactivation requested");

    let success = state.control.deactivate_bot(&reason).await;
    control_response(success, format!("Bot deactivated: {reason}"), state.control.status().await.state)
}

fn control_response(success: bool, message: String, state: BotState) -> (StatusCode, Json<ControlResponse>) {
    let code = if success { StatusCode::OK } else { StatusCode::INTERNAL_SERVER_ERROR };
    (
        code,
        Json(ControlResponse { success, message, state, timestamp: Utc::now() }),
    )
}
