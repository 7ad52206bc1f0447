//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The WebSocket endpoint at `/ws` streams [`crate::domain::LedgerEvent`]s
//! filtered by subscribed account uids, and accepts `sync` and
//! `get_banners` commands.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
