//! # pull-ledger
//!
//! Gacha pull ledger: syncs an account's pull history from the game's
//! record API into SQLite and serves banner analytics (pity counters,
//! top-rarity costs, rate-up hits) over REST and WebSocket.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── LedgerService (service/)
//!     │     └── LedgerSynchronizer ── RemoteSource (remote/)
//!     ├── EventBus (domain/)
//!     │
//!     ├── Analytics: classify → compute_stats → featured (domain/)
//!     ├── MetadataLookup, MemoCache (cache/)
//!     │
//!     └── SQLite Persistence (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod remote;
pub mod service;
pub mod ws;
