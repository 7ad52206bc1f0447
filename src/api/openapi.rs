//! OpenAPI document for the REST surface.

use utoipa::OpenApi;

use super::dto::{
    AccountListResponse, ActiveAccountResponse, BannerListResponse, ExternalSyncRequest,
    MetadataSettingsRequest, SwitchAccountRequest, SyncRequest,
};
use super::handlers::{accounts, banners, metadata, sync, system};
use crate::cache::MetadataStatus;
use crate::domain::{Account, BannerSummary, Provider, SkipReason, SyncMode, SyncOutcome, SyncReport};
use crate::error::{ErrorBody, ErrorResponse};

/// OpenAPI description of every REST endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "Pull Ledger API",
        description = "Gacha pull ledger analytics and synchronization",
        license(name = "MIT"),
    ),
    paths(
        system::health_handler,
        metadata::metadata_status,
        metadata::update_metadata_settings,
        banners::list_banners,
        sync::sync,
        sync::sync_external,
        accounts::list_accounts,
        accounts::switch_account,
        accounts::delete_account,
    ),
    components(schemas(
        system::HealthResponse,
        MetadataStatus,
        MetadataSettingsRequest,
        BannerListResponse,
        BannerSummary,
        SyncRequest,
        ExternalSyncRequest,
        SyncMode,
        SyncOutcome,
        SyncReport,
        SkipReason,
        Provider,
        AccountListResponse,
        SwitchAccountRequest,
        ActiveAccountResponse,
        Account,
        ErrorResponse,
        ErrorBody,
    )),
    tags(
        (name = "Banners", description = "Banner analytics of the active account"),
        (name = "Sync", description = "Pull record synchronization"),
        (name = "Accounts", description = "Account selection and removal"),
        (name = "System", description = "Health, metadata status and metadata settings"),
    )
)]
pub struct ApiDoc;
