use std::time::Duration;

use async_trait::async_trait;
use merakibot_core::{ApplicationError, Organization, OrganizationId};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DashboardError {
    #[error("dashboard client could not be built: {0}")]
    Client(String),
    #[error("dashboard request failed: {0}")]
    Transport(String),
    #[error("dashboard returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("dashboard response could not be decoded: {0}")]
    Decode(String),
}

impl DashboardError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status, .. } if *status == StatusCode::UNAUTHORIZED.as_u16())
    }
}

impl From<DashboardError> for ApplicationError {
    fn from(value: DashboardError) -> Self {
        ApplicationError::Connection(value.to_string())
    }
}

#[async_trait]
pub trait DashboardApi: Send + Sync {
    async fn organizations(
        &self,
        api_key: &SecretString,
    ) -> Result<Vec<Organization>, DashboardError>;

    async fn organization(
        &self,
        api_key: &SecretString,
        organization_id: &OrganizationId,
    ) -> Result<Organization, DashboardError>;
}

#[derive(Clone)]
pub struct HttpDashboardClient {
    http: Client,
    base_url: String,
}

impl HttpDashboardClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, DashboardError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("merakibot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|error| DashboardError::Client(error.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Ok(Self { http, base_url })
    }

    async fn get_json<T>(&self, path: &str, api_key: &SecretString) -> Result<T, DashboardError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{path}", self.base_url);
        debug!(event_name = "egress.meraki.request", path, "calling dashboard api");

        let response = self
            .http
            .get(&url)
            .bearer_auth(api_key.expose_secret())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|error| DashboardError::Transport(error.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DashboardError::Status { status: status.as_u16(), body });
        }

        response.json::<T>().await.map_err(|error| DashboardError::Decode(error.to_string()))
    }
}

#[async_trait]
impl DashboardApi for HttpDashboardClient {
    async fn organizations(
        &self,
        api_key: &SecretString,
    ) -> Result<Vec<Organization>, DashboardError> {
        self.get_json("/organizations", api_key).await
    }

    async fn organization(
        &self,
        api_key: &SecretString,
        organization_id: &OrganizationId,
    ) -> Result<Organization, DashboardError> {
        self.get_json(&format!("/organizations/{organization_id}"), api_key).await
    }
}
