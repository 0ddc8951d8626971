//! Domain types for ledger operations.

use rust_decimal::Decimal;
use saldra_shared::types::AccountId;
use serde::{Deserialize, Serialize};

/// The two kinds of postings.
///
/// The sign convention is fixed: a credit increases the account balance, a
/// debit decreases it. Callers submit a positive magnitude together with the
/// kind; the signed amount stored on the ledger is derived exactly once, at
/// the validation boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Decreases the account balance.
    Debit,
    /// Increases the account balance.
    Credit,
}

impl TransactionKind {
    /// Converts a positive magnitude into the signed amount for this kind.
    #[must_use]
    pub fn signed_amount(self, magnitude: Decimal) -> Decimal {
        match self {
            Self::Debit => -magnitude,
            Self::Credit => magnitude,
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debit => write!(f, "debit"),
            Self::Credit => write!(f, "credit"),
        }
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debit" => Ok(Self::Debit),
            "credit" => Ok(Self::Credit),
            _ => Err(format!("Unknown transaction kind: {s}")),
        }
    }
}

/// Account types offered by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Everyday spending account.
    Checking,
    /// Interest-bearing savings account.
    Savings,
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Checking => write!(f, "checking"),
            Self::Savings => write!(f, "savings"),
        }
    }
}

impl std::str::FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "checking" => Ok(Self::Checking),
            "savings" => Ok(Self::Savings),
            _ => Err(format!("Unknown account type: {s}")),
        }
    }
}

/// Account lifecycle states.
///
/// `Closed` is terminal: a closed account keeps its history and balance but
/// rejects all new postings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    /// Accepts postings.
    Open,
    /// Terminal state; postings are rejected.
    Closed,
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

impl std::str::FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            _ => Err(format!("Unknown account status: {s}")),
        }
    }
}

/// A posting request as submitted by a caller.
///
/// `amount` is a positive magnitude; the stored signed amount is derived from
/// `kind` during validation.
#[derive(Debug, Clone)]
pub struct PostingInput {
    /// Target account.
    pub account_id: AccountId,
    /// Positive magnitude of the posting.
    pub amount: Decimal,
    /// Debit or credit.
    pub kind: TransactionKind,
    /// Free-text description.
    pub description: String,
    /// Optional client-supplied idempotency key, unique per account.
    pub idempotency_key: Option<String>,
}

impl PostingInput {
    /// Creates a posting request without an idempotency key.
    #[must_use]
    pub fn new(
        account_id: AccountId,
        amount: Decimal,
        kind: TransactionKind,
        description: impl Into<String>,
    ) -> Self {
        Self {
            account_id,
            amount,
            kind,
            description: description.into(),
            idempotency_key: None,
        }
    }

    /// Attaches an idempotency key to this request.
    #[must_use]
    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    #[test]
    fn test_signed_amount() {
        assert_eq!(
            TransactionKind::Credit.signed_amount(dec!(100.00)),
            dec!(100.00)
        );
        assert_eq!(
            TransactionKind::Debit.signed_amount(dec!(100.00)),
            dec!(-100.00)
        );
    }

    #[test]
    fn test_kind_serde() {
        assert_eq!(
            serde_json::to_string(&TransactionKind::Debit).unwrap(),
            "\"debit\""
        );
        let kind: TransactionKind = serde_json::from_str("\"credit\"").unwrap();
        assert_eq!(kind, TransactionKind::Credit);
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!(
            TransactionKind::from_str("DEBIT").unwrap(),
            TransactionKind::Debit
        );
        assert_eq!(
            TransactionKind::from_str("credit").unwrap(),
            TransactionKind::Credit
        );
        assert!(TransactionKind::from_str("transfer").is_err());
    }

    #[test]
    fn test_account_type_round_trip() {
        for account_type in [AccountType::Checking, AccountType::Savings] {
            let parsed = AccountType::from_str(&account_type.to_string()).unwrap();
            assert_eq!(parsed, account_type);
        }
        assert!(AccountType::from_str("brokerage").is_err());
    }

    #[test]
    fn test_account_status_round_trip() {
        for status in [AccountStatus::Open, AccountStatus::Closed] {
            let parsed = AccountStatus::from_str(&status.to_string()).unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_posting_input_builder() {
        let input = PostingInput::new(
            AccountId::new(),
            dec!(50.00),
            TransactionKind::Credit,
            "salary",
        )
        .with_idempotency_key("req-1");

        assert_eq!(input.amount, dec!(50.00));
        assert_eq!(input.idempotency_key.as_deref(), Some("req-1"));
    }
}
