use std::time::Duration;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use tokio::{sync::oneshot, task::JoinHandle};
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct HealthState {
    dashboard_configured: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub dashboard: HealthCheck,
    pub checked_at: String,
}

pub fn router(dashboard_configured: bool) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { dashboard_configured })
}

/// A running health endpoint that can be stopped gracefully.
pub struct HealthServer {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl HealthServer {
    pub async fn stop(self, grace: Duration) {
        let _ = self.shutdown.send(());
        if tokio::time::timeout(grace, self.task).await.is_err() {
            warn!(
                event_name = "system.health.stop_timeout",
                correlation_id = "shutdown",
                grace_secs = grace.as_secs(),
                "health endpoint did not stop within grace period"
            );
        }
    }
}

pub async fn spawn(
    bind_address: &str,
    port: u16,
    dashboard_configured: bool,
) -> std::io::Result<HealthServer> {
    let address = format!("{bind_address}:{port}");
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!(
        event_name = "system.health.start",
        correlation_id = "bootstrap",
        bind_address = %address,
        "health endpoint started"
    );

    let (shutdown, signal) = oneshot::channel::<()>();
    let task = tokio::spawn(async move {
        let server = axum::serve(listener, router(dashboard_configured))
            .with_graceful_shutdown(async move {
                let _ = signal.await;
            });
        if let Err(error) = server.await {
            error!(
                event_name = "system.health.error",
                correlation_id = "bootstrap",
                error = %error,
                "health endpoint server terminated unexpectedly"
            );
        }
    });

    Ok(HealthServer { shutdown, task })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let dashboard = dashboard_check(state.dashboard_configured);
    let ready = dashboard.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "merakibot-server runtime initialized".to_string(),
        },
        dashboard,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

fn dashboard_check(configured: bool) -> HealthCheck {
    if configured {
        HealthCheck { status: "ready", detail: "dashboard api key configured".to_string() }
    } else {
        HealthCheck {
            status: "degraded",
            detail: "no dashboard api key; set MERAKIBOT_MERAKI_API_KEY".to_string(),
        }
    }
}
