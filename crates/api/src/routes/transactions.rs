//! Transaction posting and history routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::{AppState, middleware::AuthUser};
use saldra_core::ledger::{PostingInput, ScanOrder, Transaction, TransactionKind};
use saldra_shared::types::{AccountId, PageRequest, PageResponse, TransactionId};

use super::{accounts::load_owned_account, ledger_error_response};

/// Creates the transaction routes (requires auth middleware to be applied
/// externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accounts/{account_id}/transactions", post(post_transaction))
        .route("/accounts/{account_id}/transactions", get(list_transactions))
}

/// Request body for posting a transaction.
#[derive(Debug, Deserialize)]
pub struct PostTransactionRequest {
    /// Positive magnitude of the posting.
    pub amount: Decimal,
    /// Posting kind: debit or credit.
    pub kind: TransactionKind,
    /// Free-text description.
    pub description: String,
    /// Optional idempotency key, unique per account. Retrying a request with
    /// the same key and payload returns the original transaction.
    pub idempotency_key: Option<String>,
}

/// Query parameters for listing transactions.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Page number (1-indexed, default: 1).
    pub page: Option<u32>,
    /// Entries per page (default: 20, clamped server-side).
    pub per_page: Option<u32>,
    /// Sort order: `asc` (oldest first) or `desc` (newest first, default).
    pub order: Option<String>,
}

/// Response for a committed transaction.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// Transaction ID.
    pub id: TransactionId,
    /// Account the transaction belongs to.
    pub account_id: AccountId,
    /// Signed amount: positive for credits, negative for debits.
    pub amount: Decimal,
    /// Posting kind.
    pub kind: TransactionKind,
    /// Description.
    pub description: String,
    /// Account balance immediately after this transaction.
    pub balance_after: Decimal,
    /// Idempotency key, if one was supplied.
    pub idempotency_key: Option<String>,
    /// When the transaction was committed.
    pub created_at: DateTime<Utc>,
}

impl From<Transaction> for TransactionResponse {
    fn from(transaction: Transaction) -> Self {
        Self {
            id: transaction.id,
            account_id: transaction.account_id,
            amount: transaction.amount,
            kind: transaction.kind,
            description: transaction.description,
            balance_after: transaction.balance_after,
            idempotency_key: transaction.idempotency_key,
            created_at: transaction.created_at,
        }
    }
}

/// POST `/accounts/{account_id}/transactions` - Post a debit or credit.
///
/// Returns 201 with the committed transaction. A retry carrying the same
/// idempotency key and payload returns the original transaction, also 201.
async fn post_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(account_id): Path<AccountId>,
    Json(payload): Json<PostTransactionRequest>,
) -> impl IntoResponse {
    if let Err(response) = load_owned_account(&state, &auth, account_id).await {
        return response;
    }

    let input = PostingInput {
        account_id,
        amount: payload.amount,
        kind: payload.kind,
        description: payload.description,
        idempotency_key: payload.idempotency_key,
    };

    match state.ledger.post(input).await {
        Ok(transaction) => {
            info!(
                account_id = %account_id,
                transaction_id = %transaction.id,
                balance_after = %transaction.balance_after,
                "Transaction posted"
            );

            (
                StatusCode::CREATED,
                Json(TransactionResponse::from(transaction)),
            )
                .into_response()
        }
        Err(e) => ledger_error_response(&e),
    }
}

/// GET `/accounts/{account_id}/transactions` - Paginated transaction history.
async fn list_transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(account_id): Path<AccountId>,
    Query(query): Query<HistoryQuery>,
) -> impl IntoResponse {
    if let Err(response) = load_owned_account(&state, &auth, account_id).await {
        return response;
    }

    let Some(order) = parse_scan_order(query.order.as_deref()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_order",
                "message": "Order must be 'asc' or 'desc'"
            })),
        )
            .into_response();
    };

    let page = PageRequest {
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(20),
    };

    match state.ledger.history(account_id, page, order).await {
        Ok(history) => {
            let transactions: Vec<TransactionResponse> = history
                .transactions
                .into_iter()
                .map(TransactionResponse::from)
                .collect();

            let response = PageResponse::new(
                transactions,
                history.page,
                history.per_page,
                history.total,
            );

            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => ledger_error_response(&e),
    }
}

/// Parses the `order` query parameter; `None` input selects the default
/// (newest first).
fn parse_scan_order(raw: Option<&str>) -> Option<ScanOrder> {
    match raw {
        None => Some(ScanOrder::default()),
        Some("asc") => Some(ScanOrder::Ascending),
        Some("desc") => Some(ScanOrder::Descending),
        Some(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scan_order() {
        assert_eq!(parse_scan_order(None), Some(ScanOrder::Descending));
        assert_eq!(parse_scan_order(Some("asc")), Some(ScanOrder::Ascending));
        assert_eq!(parse_scan_order(Some("desc")), Some(ScanOrder::Descending));
        assert_eq!(parse_scan_order(Some("sideways")), None);
    }
}
