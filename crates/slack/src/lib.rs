//! Slack interface for merakibot.
//!
//! - **Socket Mode** (`socket`, `transport`, `envelope`) - WebSocket connection to Slack (no public URL needed)
//! - **Events** (`events`) - route registry, dispatcher and the bot's handlers
//! - **Slash Commands** (`commands`) - `/meraki-orgs [perPage] [page]` and its follow-up actions
//! - **Block Kit** (`blocks`) - typed message builders and the paginated organization renderer
//! - **Web API** (`web`) - `chat.postMessage`, `chat.update`, reactions and views
//!
//! # Architecture
//!
//! ```text
//! Slack ⇄ WebSocketTransport → SocketModeRunner → EventDispatcher → Handlers
//!                                                                     ↓
//!                      Slack Web API ← Block Kit ← Dashboard API (organizations)
//! ```

pub mod blocks;
pub mod commands;
pub mod context;
pub mod envelope;
pub mod events;
pub mod socket;
pub mod transport;
pub mod web;

pub use context::BotContext;
pub use events::{default_dispatcher, EventDispatcher};
pub use socket::{ReconnectPolicy, SocketModeRunner, SocketTransport};
pub use transport::WebSocketTransport;
pub use web::{HttpSlackWebApi, SlackWebApi};
