//! API route definitions.

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{error, warn};

use saldra_core::ledger::LedgerError;
use saldra_shared::AppError;

use crate::{AppState, middleware::auth::auth_middleware};

pub mod accounts;
pub mod auth;
pub mod health;
pub mod transactions;

/// Creates the API router with public and protected routes.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Protected routes that require authentication
    let protected_routes = Router::new()
        .merge(accounts::routes())
        .merge(transactions::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Combine public and protected routes
    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(protected_routes)
}

/// Maps a ledger error onto its HTTP status, stable error code, and
/// retryable flag.
///
/// Storage failures are logged here and reported with a generic message so
/// backend details never reach the client.
pub(crate) fn ledger_error_response(e: &LedgerError) -> Response {
    match e {
        LedgerError::Storage(message) => {
            error!(error = %message, "Ledger storage failure");
        }
        LedgerError::Conflict(account_id) => {
            warn!(account_id = %account_id, "Posting conflict after retries exhausted");
        }
        _ => {}
    }

    let status =
        StatusCode::from_u16(e.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let message = if matches!(e, LedgerError::Storage(_)) {
        "An internal storage error occurred".to_string()
    } else {
        e.to_string()
    };

    (
        status,
        Json(json!({
            "error": e.error_code(),
            "message": message,
            "retryable": e.is_retryable(),
        })),
    )
        .into_response()
}

/// Maps a request-layer [`AppError`] onto its HTTP status and stable code.
pub(crate) fn app_error_response(e: &AppError) -> Response {
    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    (
        status,
        Json(json!({
            "error": e.error_code(),
            "message": e.to_string(),
        })),
    )
        .into_response()
}
