//! Service layer: business logic orchestration.
//!
//! [`LedgerSynchronizer`] reconciles stored pulls with the remote source
//! under a per-mode single-flight guard. [`LedgerService`] owns the active
//! account and the banner view, and emits events through the
//! [`super::domain::EventBus`].

pub mod ledger_service;
pub mod sync_service;

pub use ledger_service::{ExternalSession, LedgerService};
pub use sync_service::LedgerSynchronizer;
