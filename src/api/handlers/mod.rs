//! REST endpoint handlers organized by resource.

pub mod accounts;
pub mod banners;
pub mod metadata;
pub mod sync;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(banners::routes())
        .merge(sync::routes())
        .merge(accounts::routes())
        .merge(metadata::routes())
}
