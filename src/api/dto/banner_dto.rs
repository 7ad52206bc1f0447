//! Banner view DTOs.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::BannerSummary;

/// Response body for `GET /banners`.
#[derive(Debug, Serialize, ToSchema)]
pub struct BannerListResponse {
    /// Account the banners belong to. `None` when no account is selected.
    pub uid: Option<String>,
    /// Banner summaries, character banners first.
    pub banners: Vec<BannerSummary>,
}
