//! Versioned ledger accounts.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use saldra_shared::types::{AccountId, Currency, Money, UserId};
use serde::{Deserialize, Serialize};

use super::types::{AccountStatus, AccountType};

/// A ledger account with a materialized balance.
///
/// The balance always equals the sum of the signed amounts of all committed
/// transactions on the account. The version increases by exactly one on every
/// committed mutation and drives the optimistic commit protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Opaque, immutable identifier.
    pub id: AccountId,
    /// The owning user.
    pub user_id: UserId,
    /// Checking or savings.
    pub account_type: AccountType,
    /// The account's currency.
    pub currency: Currency,
    /// Materialized balance; signed, never floating point.
    pub balance: Decimal,
    /// Optimistic concurrency version; starts at 0, increases by one per
    /// committed mutation.
    pub version: i64,
    /// Open or closed.
    pub status: AccountStatus,
    /// When the account was closed, if it has been.
    pub closed_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Opens a new account with a zero balance.
    #[must_use]
    pub fn open(user_id: UserId, account_type: AccountType, currency: Currency) -> Self {
        let now = Utc::now();
        Self {
            id: AccountId::new(),
            user_id,
            account_type,
            currency,
            balance: Decimal::ZERO,
            version: 0,
            status: AccountStatus::Open,
            closed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true if the account is closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.status == AccountStatus::Closed
    }

    /// Returns the balance together with the account currency.
    #[must_use]
    pub const fn balance_money(&self) -> Money {
        Money::new(self.balance, self.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_account_starts_empty() {
        let account = Account::open(UserId::new(), AccountType::Checking, Currency::Usd);

        assert_eq!(account.balance, Decimal::ZERO);
        assert_eq!(account.version, 0);
        assert_eq!(account.status, AccountStatus::Open);
        assert!(account.closed_at.is_none());
        assert!(!account.is_closed());
    }

    #[test]
    fn test_balance_money_carries_currency() {
        let account = Account::open(UserId::new(), AccountType::Savings, Currency::Eur);
        let money = account.balance_money();

        assert!(money.is_zero());
        assert_eq!(money.currency, Currency::Eur);
    }
}
