//! Metadata package status and settings.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};

use crate::api::dto::MetadataSettingsRequest;
use crate::app_state::AppState;
use crate::cache::MetadataStatus;
use crate::error::{ErrorResponse, LedgerError};

/// `GET /metadata/status`: Inspect the local metadata package.
#[utoipa::path(
    get,
    path = "/api/v1/metadata/status",
    tag = "System",
    summary = "Metadata package status",
    description = "Reports the metadata directory, its file count and the manifest version. Reads the disk on every call.",
    responses(
        (status = 200, description = "Metadata status", body = MetadataStatus),
    )
)]
pub async fn metadata_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.ledger.metadata().status().await)
}

/// `PUT /metadata/settings`: Switch the metadata language or directory.
#[utoipa::path(
    put,
    path = "/api/v1/metadata/settings",
    tag = "System",
    summary = "Change metadata settings",
    description = "Switches the metadata language and/or package directory, clears the metadata caches and rebuilds the banner view of the active account.",
    request_body = MetadataSettingsRequest,
    responses(
        (status = 200, description = "Metadata status after the change", body = MetadataStatus),
        (status = 400, description = "Blank language or directory", body = ErrorResponse),
    )
)]
pub async fn update_metadata_settings(
    State(state): State<AppState>,
    Json(req): Json<MetadataSettingsRequest>,
) -> Result<impl IntoResponse, LedgerError> {
    let (language, dir) = req.into_parts();
    let status = state
        .ledger
        .set_metadata_settings(language.as_deref(), dir)
        .await?;
    Ok(Json(status))
}

/// Metadata routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/metadata/status", get(metadata_status))
        .route("/metadata/settings", put(update_metadata_settings))
}
