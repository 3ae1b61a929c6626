use std::{sync::Arc, time::Duration};

use merakibot_core::config::{AppConfig, ConfigError};
use merakibot_meraki::{DashboardError, HttpDashboardClient};
use merakibot_slack::{
    default_dispatcher, socket::TransportError, web::WebApiError, BotContext, HttpSlackWebApi,
    ReconnectPolicy, SocketModeRunner, WebSocketTransport,
};
use thiserror::Error;
use tracing::{info, warn};

pub struct Application {
    pub config: AppConfig,
    pub slack_runner: SocketModeRunner,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("dashboard client setup failed: {0}")]
    Dashboard(#[from] DashboardError),
    #[error("slack web api client setup failed: {0}")]
    SlackWeb(#[from] WebApiError),
    #[error("socket mode transport setup failed: {0}")]
    Transport(#[from] TransportError),
}

/// Wires the Slack and Dashboard clients, the handler registry and the
/// Socket Mode runner from an already loaded config.
pub fn bootstrap(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    let timeout = Duration::from_secs(config.meraki.timeout_secs);

    let web = HttpSlackWebApi::new(
        config.slack.api_base_url.clone(),
        config.slack.bot_token.clone(),
        timeout,
    )?;
    let dashboard = HttpDashboardClient::new(config.meraki.base_url.clone(), timeout)?;
    if !config.has_meraki_api_key() {
        warn!(
            event_name = "system.bootstrap.dashboard_key_missing",
            correlation_id = "bootstrap",
            "no dashboard api key configured; /meraki-orgs will report connection failures"
        );
    }
    let bot = Arc::new(BotContext::new(
        Arc::new(web),
        Arc::new(dashboard),
        config.meraki.api_key.clone(),
    ));

    let dispatcher = default_dispatcher(bot);
    info!(
        event_name = "system.bootstrap.handlers_registered",
        correlation_id = "bootstrap",
        handler_count = dispatcher.handler_count(),
        "event handlers registered"
    );

    let transport = WebSocketTransport::new(
        config.slack.api_base_url.clone(),
        config.slack.app_token.clone(),
        timeout,
    )?;
    let slack_runner =
        SocketModeRunner::new(Arc::new(transport), dispatcher, ReconnectPolicy::default());

    Ok(Application { config, slack_runner })
}
