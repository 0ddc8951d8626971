//! Account balance calculations.
//!
//! Two paths derive a balance from the transaction log:
//!
//! - [`next_balance`] maintains the materialized balance incrementally as
//!   each posting commits (O(1), the hot path).
//! - [`recompute`] folds the full ordered log from zero (the audit path).
//!
//! Both must agree exactly; [`BalanceAudit`] reports a comparison of the two.

use rust_decimal::Decimal;
use saldra_shared::types::AccountId;
use serde::{Deserialize, Serialize};

use super::transaction::Transaction;

/// Applies one signed amount to a balance.
#[must_use]
pub fn next_balance(current: Decimal, signed_amount: Decimal) -> Decimal {
    current + signed_amount
}

/// Recomputes a balance by folding signed amounts from zero.
///
/// The iterator must yield amounts in commit order, though the final sum is
/// order-independent.
#[must_use]
pub fn recompute<I>(amounts: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    amounts
        .into_iter()
        .fold(Decimal::ZERO, |balance, amount| balance + amount)
}

/// Recomputes a balance from a slice of committed transactions.
#[must_use]
pub fn replay(transactions: &[Transaction]) -> Decimal {
    recompute(transactions.iter().map(|t| t.amount))
}

/// Result of comparing the materialized balance against a full recomputation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceAudit {
    /// The audited account.
    pub account_id: AccountId,
    /// The balance materialized on the account row.
    pub materialized: Decimal,
    /// The balance recomputed from the transaction log.
    pub recomputed: Decimal,
    /// The account version at audit time.
    pub version: i64,
    /// Number of transactions folded.
    pub transaction_count: u64,
    /// True when materialized and recomputed agree exactly.
    pub consistent: bool,
}

impl BalanceAudit {
    /// Builds an audit result, deriving the consistency flag.
    #[must_use]
    pub fn new(
        account_id: AccountId,
        materialized: Decimal,
        recomputed: Decimal,
        version: i64,
        transaction_count: u64,
    ) -> Self {
        Self {
            account_id,
            materialized,
            recomputed,
            version,
            transaction_count,
            consistent: materialized == recomputed,
        }
    }
}
