//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! dispatching incoming commands and forwarding filtered events.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::broadcast;

use super::messages::{WsCommand, WsMessage, WsMessageType};
use super::subscription::SubscriptionManager;
use crate::api::dto::parse_mode;
use crate::domain::LedgerEvent;
use crate::service::LedgerService;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and dispatches them.
/// - Forwards events of subscribed accounts from the
///   [`broadcast::Receiver`] to the client.
pub async fn run_connection(
    socket: WebSocket,
    mut event_rx: broadcast::Receiver<LedgerEvent>,
    ledger: Arc<LedgerService>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut subs = SubscriptionManager::new();

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response = handle_text_message(&text, &mut subs, &ledger).await;
                        if let Some(resp_json) = response
                            && ws_tx.send(Message::text(resp_json)).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            event = event_rx.recv() => {
                match event {
                    Ok(ledger_event) => {
                        if let Some(json) = render_event(&ledger_event, &subs)
                            && ws_tx.send(Message::text(json)).await.is_err() {
                                break;
                            }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!("ws connection closed");
}

/// Serializes `event` if the connection is subscribed to its account.
fn render_event(event: &LedgerEvent, subs: &SubscriptionManager) -> Option<String> {
    if !subs.matches(event.uid()) {
        return None;
    }
    let msg = WsMessage::event(serde_json::to_value(event).unwrap_or_default());
    serde_json::to_string(&msg).ok()
}

/// Handles a text message from the client, returning an optional JSON
/// response.
async fn handle_text_message(
    text: &str,
    subs: &mut SubscriptionManager,
    ledger: &LedgerService,
) -> Option<String> {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return serde_json::to_string(&WsMessage::error("", 400, "malformed JSON")).ok();
    };
    if msg.msg_type != WsMessageType::Command {
        return serde_json::to_string(&WsMessage::error(msg.id, 400, "expected a command")).ok();
    }
    let Ok(command) = serde_json::from_value::<WsCommand>(msg.payload) else {
        return serde_json::to_string(&WsMessage::error(msg.id, 404, "unknown command")).ok();
    };

    let payload = match command {
        WsCommand::Subscribe { uids } => {
            let added = subs.subscribe(&uids);
            json!({
                "subscribed": added,
                "count": subs.count(),
                "wildcard": subs.is_subscribed_all(),
            })
        }
        WsCommand::Unsubscribe { uids } => {
            subs.unsubscribe(&uids);
            json!({
                "unsubscribed": uids,
                "remaining_count": subs.count(),
            })
        }
        WsCommand::Sync { mode } => {
            let outcome = match parse_mode(mode.as_deref()) {
                Ok(mode) => ledger.refresh(mode).await,
                Err(e) => Err(e),
            };
            match outcome {
                Ok(outcome) => serde_json::to_value(&outcome).unwrap_or_default(),
                Err(e) => {
                    let reply = WsMessage::error(msg.id, e.error_code(), &e.to_string());
                    return serde_json::to_string(&reply).ok();
                }
            }
        }
        WsCommand::GetBanners => json!({
            "uid": ledger.active_uid().await,
            "banners": ledger.banners().await,
        }),
    };

    serde_json::to_string(&WsMessage::new(msg.id, WsMessageType::Response, payload)).ok()
}
