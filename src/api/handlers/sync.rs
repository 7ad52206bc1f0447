//! Sync handlers: user-initiated refreshes.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{ExternalSyncRequest, SyncRequest, parse_mode};
use crate::app_state::AppState;
use crate::domain::SyncOutcome;
use crate::error::{ErrorResponse, LedgerError};

/// `POST /sync`: Sync the active account.
///
/// # Errors
///
/// Returns [`LedgerError`] on an invalid mode, a missing session token,
/// or a storage failure.
#[utoipa::path(
    post,
    path = "/api/v1/sync",
    tag = "Sync",
    summary = "Sync the active account",
    description = "Fetches new pull records for the active account and rebuilds the banner view. A sync of the same mode already in flight, or no selected account, yields a `skipped` outcome.",
    request_body = SyncRequest,
    responses(
        (status = 200, description = "Sync finished or was skipped", body = SyncOutcome),
        (status = 400, description = "Invalid sync mode", body = ErrorResponse),
        (status = 409, description = "Account has no session token", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    )
)]
pub async fn sync(
    State(state): State<AppState>,
    body: Option<Json<SyncRequest>>,
) -> Result<impl IntoResponse, LedgerError> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let mode = parse_mode(req.mode.as_deref())?;
    let outcome = state.ledger.refresh(mode).await?;
    Ok(Json(outcome))
}

/// `POST /sync/external`: Register and sync an external session.
///
/// # Errors
///
/// Returns [`LedgerError`] on an invalid request, a session the remote
/// source rejects, or a storage failure.
#[utoipa::path(
    post,
    path = "/api/v1/sync/external",
    tag = "Sync",
    summary = "Sync from an external session",
    description = "Resolves the account behind a session token, stores it, makes it the active account and syncs it.",
    request_body = ExternalSyncRequest,
    responses(
        (status = 200, description = "Sync finished or was skipped", body = SyncOutcome),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 502, description = "Remote source rejected the session", body = ErrorResponse),
    )
)]
pub async fn sync_external(
    State(state): State<AppState>,
    Json(req): Json<ExternalSyncRequest>,
) -> Result<impl IntoResponse, LedgerError> {
    let (mode, session) = req.into_parts();
    let mode = parse_mode(mode.as_deref())?;
    let outcome = state
        .ledger
        .refresh_from_external_source(mode, session)
        .await?;
    Ok(Json(outcome))
}

/// Sync routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sync", post(sync))
        .route("/sync/external", post(sync_external))
}
