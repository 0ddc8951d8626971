//! Immutable ledger transactions.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use saldra_shared::types::{AccountId, TransactionId};
use serde::{Deserialize, Serialize};

use super::types::TransactionKind;

/// A committed ledger entry.
///
/// Transactions are append-only: once committed they are never edited or
/// deleted. `amount` is signed (credits positive, debits negative), so
/// replaying a transaction log is a plain sum. An account's transactions form
/// a total order by `(created_at, id)`; ids are UUID v7, which keeps ties
/// stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier, never reused.
    pub id: TransactionId,
    /// The account this entry belongs to.
    pub account_id: AccountId,
    /// Signed amount. Positive for credits, negative for debits, never zero.
    pub amount: Decimal,
    /// Debit or credit.
    pub kind: TransactionKind,
    /// Free-text description.
    pub description: String,
    /// Server-assigned creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Account balance immediately after this entry committed.
    pub balance_after: Decimal,
    /// Client-supplied idempotency key, unique per account when present.
    pub idempotency_key: Option<String>,
}

impl Transaction {
    /// Builds a transaction ready to commit.
    ///
    /// Assigns a fresh time-ordered id and the server timestamp. `amount`
    /// must already be signed according to `kind`.
    #[must_use]
    pub fn record(
        account_id: AccountId,
        amount: Decimal,
        kind: TransactionKind,
        description: String,
        balance_after: Decimal,
        idempotency_key: Option<String>,
    ) -> Self {
        Self {
            id: TransactionId::new(),
            account_id,
            amount,
            kind,
            description,
            created_at: Utc::now(),
            balance_after,
            idempotency_key,
        }
    }

    /// Returns true if this entry represents the same logical request.
    ///
    /// Used to decide whether an idempotency-key hit is a safe replay (same
    /// kind, amount, and description) or a key reuse with a different
    /// payload.
    #[must_use]
    pub fn matches_request(
        &self,
        kind: TransactionKind,
        amount: Decimal,
        description: &str,
    ) -> bool {
        self.kind == kind && self.amount == amount && self.description == description
    }
}
