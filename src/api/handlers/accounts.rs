//! Account handlers: list, switch, delete.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};

use crate::api::dto::{AccountListResponse, ActiveAccountResponse, SwitchAccountRequest};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, LedgerError};

/// `GET /accounts`: List stored accounts.
///
/// # Errors
///
/// Returns [`LedgerError::PersistenceError`] on storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/accounts",
    tag = "Accounts",
    summary = "List accounts",
    description = "Returns every stored account, most recently updated first, and the selected one.",
    responses(
        (status = 200, description = "Accounts", body = AccountListResponse),
    )
)]
pub async fn list_accounts(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, LedgerError> {
    let accounts = state.ledger.accounts().await?;
    let active = state.ledger.active_uid().await;
    Ok(Json(AccountListResponse { active, accounts }))
}

/// `PUT /accounts/active`: Select an account.
///
/// # Errors
///
/// Returns [`LedgerError::AccountNotFound`] for an unknown uid.
#[utoipa::path(
    put,
    path = "/api/v1/accounts/active",
    tag = "Accounts",
    summary = "Switch the active account",
    request_body = SwitchAccountRequest,
    responses(
        (status = 200, description = "Account selected", body = ActiveAccountResponse),
        (status = 400, description = "Empty uid", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse),
    )
)]
pub async fn switch_account(
    State(state): State<AppState>,
    Json(req): Json<SwitchAccountRequest>,
) -> Result<impl IntoResponse, LedgerError> {
    let uid = req.uid.trim();
    if uid.is_empty() {
        return Err(LedgerError::InvalidRequest("uid is empty".to_string()));
    }
    state.ledger.switch_account(uid).await?;
    Ok(Json(ActiveAccountResponse {
        active: Some(uid.to_string()),
    }))
}

/// `DELETE /accounts/active`: Delete the selected account and its pulls.
///
/// # Errors
///
/// Returns [`LedgerError::NoActiveAccount`] when nothing is selected.
#[utoipa::path(
    delete,
    path = "/api/v1/accounts/active",
    tag = "Accounts",
    summary = "Delete the active account",
    description = "Deletes the selected account together with its pull records, then selects the next most recent account.",
    responses(
        (status = 200, description = "Account deleted", body = ActiveAccountResponse),
        (status = 409, description = "No account selected", body = ErrorResponse),
    )
)]
pub async fn delete_account(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, LedgerError> {
    let active = state.ledger.delete_account().await?;
    Ok(Json(ActiveAccountResponse { active }))
}

/// Account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accounts", get(list_accounts))
        .route("/accounts/active", put(switch_account).delete(delete_account))
}
