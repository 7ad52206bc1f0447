//! Banner view handler.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::BannerListResponse;
use crate::app_state::AppState;

/// `GET /banners`: Banner summaries of the active account.
#[utoipa::path(
    get,
    path = "/api/v1/banners",
    tag = "Banners",
    summary = "List banner summaries",
    description = "Returns the banner view of the active account: pity counters, top-rarity history with costs and rate-up flags. Empty when no account is selected.",
    responses(
        (status = 200, description = "Banner summaries", body = BannerListResponse),
    )
)]
pub async fn list_banners(State(state): State<AppState>) -> impl IntoResponse {
    let uid = state.ledger.active_uid().await;
    let banners = state.ledger.banners().await;
    Json(BannerListResponse { uid, banners })
}

/// Banner routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/banners", get(list_banners))
}
