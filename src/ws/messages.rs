//! WebSocket message types: envelope and commands.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top-level WebSocket message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage {
    /// Client-provided ID for requests; server-generated for events.
    #[serde(default)]
    pub id: String,
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub msg_type: WsMessageType,
    /// ISO-8601 timestamp.
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// Variant-specific payload.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl WsMessage {
    /// Builds a server message stamped with the current time.
    #[must_use]
    pub fn new(id: impl Into<String>, msg_type: WsMessageType, payload: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            msg_type,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Builds an event message with a fresh id.
    #[must_use]
    pub fn event(payload: serde_json::Value) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), WsMessageType::Event, payload)
    }

    /// Builds an error reply to request `id`.
    #[must_use]
    pub fn error(id: impl Into<String>, code: u32, message: &str) -> Self {
        Self::new(
            id,
            WsMessageType::Error,
            serde_json::json!({ "code": code, "message": message }),
        )
    }
}

/// Discriminator for WebSocket message types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WsMessageType {
    /// Client → Server command.
    Command,
    /// Server → Client response to a command.
    Response,
    /// Server → Client broadcast event.
    Event,
    /// Server → Client error.
    Error,
}

/// Commands that a client can send over WebSocket, carried in the
/// payload of a [`WsMessageType::Command`] message.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum WsCommand {
    /// Subscribe to events of specific accounts.
    Subscribe {
        /// Account uids to subscribe to. Use `["*"]` for all accounts.
        uids: Vec<String>,
    },
    /// Unsubscribe from events of specific accounts.
    Unsubscribe {
        /// Account uids to unsubscribe from.
        uids: Vec<String>,
    },
    /// Sync the active account.
    Sync {
        /// `incremental` (default) or `full`.
        #[serde(default)]
        mode: Option<String>,
    },
    /// Get the banner view of the active account.
    GetBanners,
}
