//! Metadata settings DTOs.

use std::path::PathBuf;

use serde::Deserialize;
use utoipa::ToSchema;

/// Request body for `PUT /metadata/settings`. Omitted fields keep their
/// current value.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct MetadataSettingsRequest {
    /// Language used for item names and pool metadata, e.g. `en-us`.
    #[serde(default)]
    pub language: Option<String>,
    /// Metadata package directory.
    #[serde(default)]
    pub dir: Option<String>,
}

impl MetadataSettingsRequest {
    /// Splits the request into the language and directory to apply.
    #[must_use]
    pub fn into_parts(self) -> (Option<String>, Option<PathBuf>) {
        (self.language, self.dir.map(PathBuf::from))
    }
}
