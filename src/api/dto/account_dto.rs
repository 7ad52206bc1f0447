//! Account DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::Account;

/// Response body for `GET /accounts`.
#[derive(Debug, Serialize, ToSchema)]
pub struct AccountListResponse {
    /// Currently selected account.
    pub active: Option<String>,
    /// Stored accounts, most recently updated first.
    pub accounts: Vec<Account>,
}

/// Request body for `PUT /accounts/active`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SwitchAccountRequest {
    /// Account to select.
    pub uid: String,
}

/// Response body for account selection changes.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActiveAccountResponse {
    /// Newly selected account, if any remains.
    pub active: Option<String>,
}
