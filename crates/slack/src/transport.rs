use std::time::Duration;

use async_trait::async_trait;
use futures_util::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tokio::{net::TcpStream, sync::Mutex};
use tokio_tungstenite::{tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::{
    envelope::{parse_socket_frame, SocketFrame},
    events::SlackEnvelope,
    socket::{SocketTransport, TransportError},
    web::ensure_ok,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Socket Mode over a real WebSocket: `apps.connections.open` hands out a
/// single-use URL, which is dialled on every (re)connect.
pub struct WebSocketTransport {
    http: Client,
    api_base_url: String,
    app_token: SecretString,
    reader: Mutex<Option<SplitStream<WsStream>>>,
    writer: Mutex<Option<SplitSink<WsStream, Message>>>,
}

impl WebSocketTransport {
    pub fn new(
        api_base_url: impl Into<String>,
        app_token: SecretString,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| TransportError::Connect(error.to_string()))?;
        Ok(Self {
            http,
            api_base_url: api_base_url.into().trim_end_matches('/').to_owned(),
            app_token,
            reader: Mutex::new(None),
            writer: Mutex::new(None),
        })
    }

    async fn open_connection_url(&self) -> Result<String, TransportError> {
        let response = self
            .http
            .post(format!("{}/apps.connections.open", self.api_base_url))
            .bearer_auth(self.app_token.expose_secret())
            .send()
            .await
            .map_err(|error| TransportError::Connect(error.without_url().to_string()))?;
        let payload = response
            .json::<Value>()
            .await
            .map_err(|error| TransportError::Connect(error.to_string()))?;
        let payload = ensure_ok(payload).map_err(|error| TransportError::Connect(error.to_string()))?;

        payload
            .get("url")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| TransportError::Connect("apps.connections.open returned no url".into()))
    }

    async fn send(&self, message: Message) -> Result<(), TransportError> {
        let mut writer = self.writer.lock().await;
        let Some(sink) = writer.as_mut() else {
            return Err(TransportError::Acknowledge("not connected".to_owned()));
        };
        sink.send(message).await.map_err(|error| TransportError::Acknowledge(error.to_string()))
    }
}

#[async_trait]
impl SocketTransport for WebSocketTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        let url = self.open_connection_url().await?;
        let (stream, _) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|error| TransportError::Connect(error.to_string()))?;
        let (sink, source) = stream.split();
        *self.writer.lock().await = Some(sink);
        *self.reader.lock().await = Some(source);
        Ok(())
    }

    async fn next_envelope(&self) -> Result<Option<SlackEnvelope>, TransportError> {
        loop {
            let message = {
                let mut reader = self.reader.lock().await;
                let Some(source) = reader.as_mut() else {
                    return Err(TransportError::Receive("not connected".to_owned()));
                };
                source.next().await
            };

            match message {
                Some(Ok(Message::Text(text))) => match parse_socket_frame(&text) {
                    Ok(SocketFrame::Hello) => debug!("received socket mode hello"),
                    Ok(SocketFrame::Disconnect { reason }) => {
                        return Err(TransportError::Disconnected(reason));
                    }
                    Ok(SocketFrame::Envelope(envelope)) => return Ok(Some(envelope)),
                    Err(error) => {
                        warn!(
                            event_name = "ingress.slack.frame_undecodable",
                            envelope_id = error.envelope_id().unwrap_or("none"),
                            error = %error,
                            "skipping undecodable socket mode frame"
                        );
                        if let Some(envelope_id) = error.envelope_id() {
                            if let Err(error) = self.acknowledge(envelope_id).await {
                                warn!(error = %error, "failed to acknowledge undecodable frame");
                            }
                        }
                    }
                },
                Some(Ok(Message::Ping(payload))) => {
                    if let Err(error) = self.send(Message::Pong(payload)).await {
                        debug!(error = %error, "pong failed");
                    }
                }
                Some(Ok(Message::Close(_))) => {
                    return Err(TransportError::Receive("closed by server".to_owned()));
                }
                Some(Ok(_)) => {}
                Some(Err(error)) => return Err(TransportError::Receive(error.to_string())),
                None => return Err(TransportError::Receive("stream ended".to_owned())),
            }
        }
    }

    async fn acknowledge(&self, envelope_id: &str) -> Result<(), TransportError> {
        let ack = json!({ "envelope_id": envelope_id }).to_string();
        self.send(Message::Text(ack)).await
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        self.reader.lock().await.take();
        let Some(mut sink) = self.writer.lock().await.take() else {
            return Ok(());
        };
        info!("closing socket mode connection");
        sink.close().await.map_err(|error| TransportError::Disconnect(error.to_string()))
    }
}
