//! Account lifecycle and balance routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::{AppState, middleware::AuthUser};
use saldra_core::ledger::{Account, AccountStatus, AccountType};
use saldra_shared::AppError;
use saldra_shared::types::{AccountId, Currency, Money, UserId};

use super::{app_error_response, ledger_error_response};

/// Creates the account routes (requires auth middleware to be applied
/// externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accounts", post(create_account))
        .route("/accounts", get(list_accounts))
        .route("/accounts/{account_id}", get(get_account))
        .route("/accounts/{account_id}/close", post(close_account))
        .route("/accounts/{account_id}/balance", get(get_balance))
        .route("/accounts/{account_id}/balance/audit", get(get_balance_audit))
}

/// Request body for opening an account.
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    /// Account type: checking or savings.
    #[serde(rename = "type")]
    pub account_type: AccountType,
    /// Currency code, e.g. USD.
    pub currency: Currency,
}

/// Response for an account.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    /// Account ID.
    pub id: AccountId,
    /// Account type.
    #[serde(rename = "type")]
    pub account_type: AccountType,
    /// Currency code.
    pub currency: Currency,
    /// Materialized balance.
    pub balance: Decimal,
    /// Version, incremented on every committed mutation.
    pub version: i64,
    /// Lifecycle status.
    pub status: AccountStatus,
    /// When the account was closed, if it is.
    pub closed_at: Option<DateTime<Utc>>,
    /// When the account was opened.
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            account_type: account.account_type,
            currency: account.currency,
            balance: account.balance,
            version: account.version,
            status: account.status,
            closed_at: account.closed_at,
            created_at: account.created_at,
        }
    }
}

/// POST `/accounts` - Open a new account for the authenticated user.
async fn create_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateAccountRequest>,
) -> impl IntoResponse {
    let user_id = UserId::from_uuid(auth.user_id());

    match state
        .ledger
        .open_account(user_id, payload.account_type, payload.currency)
        .await
    {
        Ok(account) => {
            info!(
                user_id = %user_id,
                account_id = %account.id,
                "Account opened"
            );
            (StatusCode::CREATED, Json(AccountResponse::from(account))).into_response()
        }
        Err(e) => ledger_error_response(&e),
    }
}

/// GET `/accounts` - List the authenticated user's accounts.
async fn list_accounts(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let user_id = UserId::from_uuid(auth.user_id());

    match state.ledger.accounts_for_owner(user_id).await {
        Ok(accounts) => {
            let accounts: Vec<AccountResponse> =
                accounts.into_iter().map(AccountResponse::from).collect();

            (StatusCode::OK, Json(json!({ "accounts": accounts }))).into_response()
        }
        Err(e) => ledger_error_response(&e),
    }
}

/// GET `/accounts/{account_id}` - Account detail.
async fn get_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(account_id): Path<AccountId>,
) -> impl IntoResponse {
    match load_owned_account(&state, &auth, account_id).await {
        Ok(account) => (StatusCode::OK, Json(AccountResponse::from(account))).into_response(),
        Err(response) => response,
    }
}

/// POST `/accounts/{account_id}/close` - Close an account.
async fn close_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(account_id): Path<AccountId>,
) -> impl IntoResponse {
    if let Err(response) = load_owned_account(&state, &auth, account_id).await {
        return response;
    }

    match state.ledger.close_account(account_id).await {
        Ok(account) => {
            info!(account_id = %account_id, "Account closed");
            (StatusCode::OK, Json(AccountResponse::from(account))).into_response()
        }
        Err(e) => ledger_error_response(&e),
    }
}

/// GET `/accounts/{account_id}/balance` - Materialized balance and version.
async fn get_balance(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(account_id): Path<AccountId>,
) -> impl IntoResponse {
    match load_owned_account(&state, &auth, account_id).await {
        Ok(account) => {
            let balance: Money = account.balance_money();

            (
                StatusCode::OK,
                Json(json!({
                    "account_id": account.id,
                    "balance": balance,
                    "version": account.version,
                })),
            )
                .into_response()
        }
        Err(response) => response,
    }
}

/// GET `/accounts/{account_id}/balance/audit` - Recompute the balance from
/// the transaction log and compare it with the materialized value.
async fn get_balance_audit(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(account_id): Path<AccountId>,
) -> impl IntoResponse {
    if let Err(response) = load_owned_account(&state, &auth, account_id).await {
        return response;
    }

    match state.ledger.audit_balance(account_id).await {
        Ok(audit) => {
            if !audit.consistent {
                warn!(
                    account_id = %account_id,
                    materialized = %audit.materialized,
                    recomputed = %audit.recomputed,
                    "Balance audit mismatch"
                );
            }

            (StatusCode::OK, Json(audit)).into_response()
        }
        Err(e) => ledger_error_response(&e),
    }
}

/// Loads an account and verifies it belongs to the authenticated user.
pub(crate) async fn load_owned_account(
    state: &AppState,
    auth: &AuthUser,
    account_id: AccountId,
) -> Result<Account, Response> {
    let account = match state.ledger.account(account_id).await {
        Ok(account) => account,
        Err(e) => return Err(ledger_error_response(&e)),
    };

    if account.user_id != UserId::from_uuid(auth.user_id()) {
        return Err(app_error_response(&AppError::Forbidden(
            "account belongs to another user".to_string(),
        )));
    }

    Ok(account)
}
