use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use crate::blocks::{MessageTemplate, View};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WebApiError {
    #[error("slack web api request failed: {0}")]
    Transport(String),
    #[error("slack web api returned error `{0}`")]
    Api(String),
    #[error("slack web api response could not be decoded: {0}")]
    Decode(String),
}

/// Where a posted message lives, used to update it in place later.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct PostedMessage {
    pub channel: String,
    pub ts: String,
}

#[async_trait]
pub trait SlackWebApi: Send + Sync {
    async fn post_message(
        &self,
        channel: &str,
        thread_ts: Option<&str>,
        message: &MessageTemplate,
    ) -> Result<PostedMessage, WebApiError>;

    async fn update_message(
        &self,
        target: &PostedMessage,
        message: &MessageTemplate,
    ) -> Result<(), WebApiError>;

    async fn add_reaction(
        &self,
        channel: &str,
        timestamp: &str,
        name: &str,
    ) -> Result<(), WebApiError>;

    async fn publish_view(&self, user_id: &str, view: &View) -> Result<(), WebApiError>;

    async fn open_view(&self, trigger_id: &str, view: &View) -> Result<(), WebApiError>;
}

#[derive(Clone)]
pub struct HttpSlackWebApi {
    http: Client,
    base_url: String,
    bot_token: SecretString,
}

impl HttpSlackWebApi {
    pub fn new(
        base_url: impl Into<String>,
        bot_token: SecretString,
        timeout: Duration,
    ) -> Result<Self, WebApiError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| WebApiError::Transport(error.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Ok(Self { http, base_url, bot_token })
    }

    async fn call(&self, method: &str, body: Value) -> Result<Value, WebApiError> {
        debug!(event_name = "egress.slack.web_api", method, "calling slack web api");

        let response = self
            .http
            .post(format!("{}/{method}", self.base_url))
            .bearer_auth(self.bot_token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|error| WebApiError::Transport(error.without_url().to_string()))?;

        let payload = response
            .json::<Value>()
            .await
            .map_err(|error| WebApiError::Decode(error.to_string()))?;
        ensure_ok(payload)
    }
}

pub(crate) fn ensure_ok(payload: Value) -> Result<Value, WebApiError> {
    if payload.get("ok").and_then(Value::as_bool) == Some(true) {
        return Ok(payload);
    }
    let code = payload.get("error").and_then(Value::as_str).unwrap_or("unknown_error");
    Err(WebApiError::Api(code.to_owned()))
}

fn message_body(message: &MessageTemplate) -> Result<Value, WebApiError> {
    serde_json::to_value(&message.blocks).map_err(|error| WebApiError::Decode(error.to_string()))
}

fn view_body(view: &View) -> Result<Value, WebApiError> {
    serde_json::to_value(view).map_err(|error| WebApiError::Decode(error.to_string()))
}

#[async_trait]
impl SlackWebApi for HttpSlackWebApi {
    async fn post_message(
        &self,
        channel: &str,
        thread_ts: Option<&str>,
        message: &MessageTemplate,
    ) -> Result<PostedMessage, WebApiError> {
        let mut body = json!({ "channel": channel, "text": message.fallback_text });
        if !message.blocks.is_empty() {
            body["blocks"] = message_body(message)?;
        }
        if let Some(thread_ts) = thread_ts {
            body["thread_ts"] = Value::from(thread_ts);
        }

        let payload = self.call("chat.postMessage", body).await?;
        serde_json::from_value(payload).map_err(|error| WebApiError::Decode(error.to_string()))
    }

    async fn update_message(
        &self,
        target: &PostedMessage,
        message: &MessageTemplate,
    ) -> Result<(), WebApiError> {
        // An empty block list clears blocks left over from a previous render.
        let body = json!({
            "channel": target.channel,
            "ts": target.ts,
            "text": message.fallback_text,
            "blocks": message_body(message)?,
        });
        self.call("chat.update", body).await.map(|_| ())
    }

    async fn add_reaction(
        &self,
        channel: &str,
        timestamp: &str,
        name: &str,
    ) -> Result<(), WebApiError> {
        let body = json!({ "channel": channel, "timestamp": timestamp, "name": name });
        self.call("reactions.add", body).await.map(|_| ())
    }

    async fn publish_view(&self, user_id: &str, view: &View) -> Result<(), WebApiError> {
        let body = json!({ "user_id": user_id, "view": view_body(view)? });
        self.call("views.publish", body).await.map(|_| ())
    }

    async fn open_view(&self, trigger_id: &str, view: &View) -> Result<(), WebApiError> {
        let body = json!({ "trigger_id": trigger_id, "view": view_body(view)? });
        self.call("views.open", body).await.map(|_| ())
    }
}
