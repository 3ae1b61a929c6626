use std::sync::Arc;

use merakibot_core::{ApplicationError, Organization, OrganizationId};
use merakibot_meraki::{DashboardApi, DashboardError};
use secrecy::SecretString;
use tracing::warn;

use crate::web::SlackWebApi;

/// Process-wide collaborators shared by every handler.
///
/// Built once at startup and handed to handlers explicitly, so tests can
/// assemble one from fakes.
pub struct BotContext {
    pub web: Arc<dyn SlackWebApi>,
    pub dashboard: Arc<dyn DashboardApi>,
    pub dashboard_api_key: Option<SecretString>,
}

impl BotContext {
    pub fn new(
        web: Arc<dyn SlackWebApi>,
        dashboard: Arc<dyn DashboardApi>,
        dashboard_api_key: Option<SecretString>,
    ) -> Self {
        Self { web, dashboard, dashboard_api_key }
    }

    fn api_key(&self) -> Result<&SecretString, ApplicationError> {
        self.dashboard_api_key
            .as_ref()
            .ok_or_else(|| ApplicationError::Connection("no dashboard api key configured".into()))
    }

    pub async fn fetch_organizations(&self) -> Result<Vec<Organization>, ApplicationError> {
        let api_key = self.api_key()?;
        self.dashboard.organizations(api_key).await.map_err(dashboard_failure)
    }

    pub async fn fetch_organization(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Organization, ApplicationError> {
        let api_key = self.api_key()?;
        self.dashboard.organization(api_key, organization_id).await.map_err(dashboard_failure)
    }
}

fn dashboard_failure(error: DashboardError) -> ApplicationError {
    if error.is_unauthorized() {
        warn!(
            event_name = "egress.meraki.unauthorized",
            "dashboard rejected the configured api key; check MERAKIBOT_MERAKI_API_KEY"
        );
    }
    error.into()
}
