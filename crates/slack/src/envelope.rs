//! Decoding of Socket Mode frames into typed envelopes.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::{
    commands::SlashCommandPayload,
    events::{
        AppHomeOpenedEvent, BlockActionEvent, MessageEvent, ShortcutEvent, SlackEnvelope,
        SlackEvent, ViewSubmissionEvent,
    },
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SocketFrame {
    Hello,
    Disconnect { reason: String },
    Envelope(SlackEnvelope),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("socket frame is not valid json: {0}")]
    Malformed(String),
    #[error("`{kind}` frame has no envelope id")]
    MissingEnvelopeId { kind: String },
    #[error("`{kind}` payload of envelope {envelope_id} could not be decoded: {reason}")]
    Payload { envelope_id: String, kind: String, reason: String },
}

impl FrameError {
    /// The envelope id of a frame that was addressed but could not be decoded.
    /// Such frames still need an ack or Slack redelivers them.
    pub fn envelope_id(&self) -> Option<&str> {
        match self {
            Self::Payload { envelope_id, .. } => Some(envelope_id),
            Self::Malformed(_) | Self::MissingEnvelopeId { .. } => None,
        }
    }
}

#[derive(Deserialize)]
struct RawFrame {
    #[serde(rename = "type")]
    kind: String,
    envelope_id: Option<String>,
    reason: Option<String>,
    #[serde(default)]
    payload: Value,
}

#[derive(Deserialize)]
struct RawSlashCommand {
    command: String,
    #[serde(default)]
    text: String,
    channel_id: String,
    user_id: String,
    #[serde(default)]
    user_name: String,
}

#[derive(Deserialize)]
struct RawMessage {
    #[serde(default)]
    channel: String,
    #[serde(default)]
    ts: String,
    user: Option<String>,
    #[serde(default)]
    text: String,
    bot_id: Option<String>,
    subtype: Option<String>,
}

impl From<RawMessage> for MessageEvent {
    fn from(raw: RawMessage) -> Self {
        Self {
            channel_id: raw.channel,
            ts: raw.ts,
            user_id: raw.user,
            text: raw.text,
            bot_id: raw.bot_id,
            subtype: raw.subtype,
        }
    }
}

#[derive(Deserialize)]
struct RawHomeOpened {
    user: String,
}

#[derive(Default, Deserialize)]
struct RawUser {
    #[serde(default)]
    id: String,
    username: Option<String>,
    name: Option<String>,
}

impl RawUser {
    fn display_name(&self) -> String {
        self.username.clone().or_else(|| self.name.clone()).unwrap_or_else(|| self.id.clone())
    }
}

#[derive(Deserialize)]
struct RawChannel {
    id: String,
}

#[derive(Deserialize)]
struct RawContainer {
    channel_id: Option<String>,
    message_ts: Option<String>,
}

#[derive(Deserialize)]
struct RawAction {
    action_id: String,
    block_id: Option<String>,
    value: Option<String>,
}

#[derive(Deserialize)]
struct RawView {
    #[serde(default)]
    callback_id: String,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RawInteraction {
    BlockActions {
        #[serde(default)]
        user: RawUser,
        channel: Option<RawChannel>,
        container: Option<RawContainer>,
        #[serde(default)]
        actions: Vec<RawAction>,
    },
    ViewSubmission {
        #[serde(default)]
        user: RawUser,
        view: RawView,
    },
    Shortcut {
        callback_id: String,
        trigger_id: String,
        #[serde(default)]
        user: RawUser,
    },
}

/// Decodes one text frame received on the Socket Mode connection.
pub fn parse_socket_frame(text: &str) -> Result<SocketFrame, FrameError> {
    let frame: RawFrame =
        serde_json::from_str(text).map_err(|error| FrameError::Malformed(error.to_string()))?;

    match frame.kind.as_str() {
        "hello" => return Ok(SocketFrame::Hello),
        "disconnect" => {
            let reason = frame.reason.unwrap_or_else(|| "unknown".to_owned());
            return Ok(SocketFrame::Disconnect { reason });
        }
        _ => {}
    }

    let Some(envelope_id) = frame.envelope_id else {
        return Err(FrameError::MissingEnvelopeId { kind: frame.kind });
    };
    let event = match frame.kind.as_str() {
        "events_api" => events_api_event(frame.payload),
        "slash_commands" => slash_command_event(frame.payload, &envelope_id),
        "interactive" => interactive_event(frame.payload),
        other => Ok(SlackEvent::Unsupported { event_type: other.to_owned() }),
    }
    .map_err(|PayloadError { kind, reason }| FrameError::Payload {
        envelope_id: envelope_id.clone(),
        kind,
        reason,
    })?;

    Ok(SocketFrame::Envelope(SlackEnvelope { envelope_id, event }))
}

struct PayloadError {
    kind: String,
    reason: String,
}

fn decode<T>(kind: &str, value: Value) -> Result<T, PayloadError>
where
    T: for<'de> Deserialize<'de>,
{
    serde_json::from_value(value)
        .map_err(|error| PayloadError { kind: kind.to_owned(), reason: error.to_string() })
}

fn events_api_event(mut payload: Value) -> Result<SlackEvent, PayloadError> {
    let event = payload.get_mut("event").map(Value::take).unwrap_or_default();
    let event_type = event.get("type").and_then(Value::as_str).unwrap_or("unknown").to_owned();

    Ok(match event_type.as_str() {
        "message" => SlackEvent::Message(decode::<RawMessage>(&event_type, event)?.into()),
        "app_mention" => SlackEvent::AppMention(decode::<RawMessage>(&event_type, event)?.into()),
        "app_home_opened" => {
            let raw: RawHomeOpened = decode(&event_type, event)?;
            SlackEvent::AppHomeOpened(AppHomeOpenedEvent { user_id: raw.user })
        }
        _ => SlackEvent::Unsupported { event_type },
    })
}

fn slash_command_event(payload: Value, envelope_id: &str) -> Result<SlackEvent, PayloadError> {
    let raw: RawSlashCommand = decode("slash_commands", payload)?;
    Ok(SlackEvent::SlashCommand(SlashCommandPayload {
        command: raw.command,
        text: raw.text,
        channel_id: raw.channel_id,
        user_id: raw.user_id,
        user_name: raw.user_name,
        request_id: envelope_id.to_owned(),
    }))
}

fn interactive_event(payload: Value) -> Result<SlackEvent, PayloadError> {
    let interaction_type =
        payload.get("type").and_then(Value::as_str).unwrap_or("unknown").to_owned();
    if !matches!(interaction_type.as_str(), "block_actions" | "view_submission" | "shortcut") {
        return Ok(SlackEvent::Unsupported { event_type: interaction_type });
    }

    Ok(match decode::<RawInteraction>(&interaction_type, payload)? {
        RawInteraction::BlockActions { user, channel, container, actions } => {
            let Some(action) = actions.into_iter().next() else {
                return Ok(SlackEvent::Unsupported { event_type: interaction_type });
            };
            let container_channel = container.as_ref().and_then(|c| c.channel_id.clone());
            SlackEvent::BlockAction(BlockActionEvent {
                channel_id: channel.map(|channel| channel.id).or(container_channel),
                message_ts: container.and_then(|container| container.message_ts),
                user_name: user.display_name(),
                user_id: user.id,
                action_id: action.action_id,
                block_id: action.block_id,
                value: action.value,
            })
        }
        RawInteraction::ViewSubmission { user, view } => {
            SlackEvent::ViewSubmission(ViewSubmissionEvent {
                callback_id: view.callback_id,
                user_id: user.id,
            })
        }
        RawInteraction::Shortcut { callback_id, trigger_id, user } => {
            SlackEvent::Shortcut(ShortcutEvent { callback_id, trigger_id, user_id: user.id })
        }
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{parse_socket_frame, FrameError, SocketFrame};
    use crate::events::{SlackEnvelope, SlackEvent};

    fn envelope(frame: serde_json::Value) -> SlackEnvelope {
        match parse_socket_frame(&frame.to_string()).expect("parse frame") {
            SocketFrame::Envelope(envelope) => envelope,
            other => panic!("expected envelope, got {other:?}"),
        }
    }

    #[test]
    fn control_frames_are_recognised() {
        assert_eq!(
            parse_socket_frame(r#"{"type":"hello","num_connections":1}"#),
            Ok(SocketFrame::Hello)
        );
        assert_eq!(
            parse_socket_frame(r#"{"type":"disconnect","reason":"refresh_requested"}"#),
            Ok(SocketFrame::Disconnect { reason: "refresh_requested".to_owned() })
        );
    }

    #[test]
    fn slash_command_uses_envelope_id_as_request_id() {
        let envelope = envelope(json!({
            "envelope_id": "env-cmd",
            "type": "slash_commands",
            "payload": {
                "command": "/meraki-orgs",
                "text": "5 2",
                "channel_id": "C1",
                "user_id": "U1",
                "user_name": "alice",
                "trigger_id": "T1"
            }
        }));

        let SlackEvent::SlashCommand(payload) = envelope.event else {
            panic!("expected slash command");
        };
        assert_eq!(payload.command, "/meraki-orgs");
        assert_eq!(payload.text, "5 2");
        assert_eq!(payload.user_name, "alice");
        assert_eq!(payload.request_id, "env-cmd");
    }

    #[test]
    fn events_api_messages_keep_bot_markers() {
        let envelope = envelope(json!({
            "envelope_id": "env-msg",
            "type": "events_api",
            "payload": { "event": {
                "type": "message",
                "channel": "C1",
                "ts": "1.1",
                "text": "hello",
                "bot_id": "B1"
            }}
        }));

        let SlackEvent::Message(message) = envelope.event else {
            panic!("expected message");
        };
        assert_eq!(message.text, "hello");
        assert!(message.is_from_bot());
    }

    #[test]
    fn app_home_and_mentions_decode() {
        let home = envelope(json!({
            "envelope_id": "env-home",
            "type": "events_api",
            "payload": { "event": { "type": "app_home_opened", "user": "U7", "tab": "home" } }
        }));
        assert!(matches!(home.event, SlackEvent::AppHomeOpened(ref event) if event.user_id == "U7"));

        let mention = envelope(json!({
            "envelope_id": "env-mention",
            "type": "events_api",
            "payload": { "event": {
                "type": "app_mention", "channel": "C2", "ts": "9.9", "user": "U2", "text": "<@B> hi"
            }}
        }));
        assert!(matches!(mention.event, SlackEvent::AppMention(ref event) if event.ts == "9.9"));
    }

    #[test]
    fn block_action_carries_message_and_view_state() {
        let envelope = envelope(json!({
            "envelope_id": "env-act",
            "type": "interactive",
            "payload": {
                "type": "block_actions",
                "user": { "id": "U1", "username": "alice", "name": "alice.w" },
                "channel": { "id": "C1" },
                "container": { "type": "message", "message_ts": "100.1", "channel_id": "C1" },
                "trigger_id": "T9",
                "actions": [{
                    "action_id": "orgs.nav.next.v1",
                    "block_id": "orgs.nav.3.1.v1",
                    "value": "next"
                }]
            }
        }));

        let SlackEvent::BlockAction(action) = envelope.event else {
            panic!("expected block action");
        };
        assert_eq!(action.user_name, "alice");
        assert_eq!(action.channel_id.as_deref(), Some("C1"));
        assert_eq!(action.message_ts.as_deref(), Some("100.1"));
        assert_eq!(action.block_id.as_deref(), Some("orgs.nav.3.1.v1"));
        assert_eq!(action.value.as_deref(), Some("next"));
    }

    #[test]
    fn shortcut_and_view_submission_decode() {
        let shortcut = envelope(json!({
            "envelope_id": "env-sc",
            "type": "interactive",
            "payload": {
                "type": "shortcut",
                "callback_id": "socket-mode",
                "trigger_id": "T1",
                "user": { "id": "U1" }
            }
        }));
        assert!(matches!(
            shortcut.event,
            SlackEvent::Shortcut(ref event) if event.callback_id == "socket-mode" && event.trigger_id == "T1"
        ));

        let submission = envelope(json!({
            "envelope_id": "env-vs",
            "type": "interactive",
            "payload": {
                "type": "view_submission",
                "user": { "id": "U1" },
                "view": { "callback_id": "socket_modal_submission", "state": {} }
            }
        }));
        assert!(matches!(
            submission.event,
            SlackEvent::ViewSubmission(ref event) if event.callback_id == "socket_modal_submission"
        ));
    }

    #[test]
    fn unknown_kinds_become_unsupported() {
        let envelope = envelope(json!({
            "envelope_id": "env-x",
            "type": "events_api",
            "payload": { "event": { "type": "reaction_added" } }
        }));
        assert_eq!(envelope.event, SlackEvent::Unsupported { event_type: "reaction_added".to_owned() });
    }

    #[test]
    fn malformed_frames_are_errors() {
        assert!(matches!(parse_socket_frame("not json"), Err(FrameError::Malformed(_))));
        assert_eq!(
            parse_socket_frame(r#"{"type":"events_api","payload":{}}"#),
            Err(FrameError::MissingEnvelopeId { kind: "events_api".to_owned() })
        );
        assert_eq!(FrameError::Malformed("eof".to_owned()).envelope_id(), None);
    }

    #[test]
    fn undecodable_payload_keeps_its_envelope_id() {
        let error = parse_socket_frame(
            r#"{"envelope_id":"env-bad","type":"slash_commands","payload":{"text":"x"}}"#,
        )
        .expect_err("slash command without channel should fail");

        assert!(matches!(
            error,
            FrameError::Payload { ref kind, .. } if kind == "slash_commands"
        ));
        assert_eq!(error.envelope_id(), Some("env-bad"));
    }
}
