//! Postgres enum mappings.
//!
//! Each enum mirrors a `CREATE TYPE ... AS ENUM` from the initial migration
//! and converts to and from the engine's domain enums.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use saldra_core::ledger;

/// Account product type (`account_type`).
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "account_type")]
pub enum AccountType {
    /// Checking account.
    #[sea_orm(string_value = "checking")]
    Checking,
    /// Savings account.
    #[sea_orm(string_value = "savings")]
    Savings,
}

/// Account lifecycle state (`account_status`).
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "account_status")]
pub enum AccountStatus {
    /// Account accepts postings.
    #[sea_orm(string_value = "open")]
    Open,
    /// Account is closed; postings are rejected.
    #[sea_orm(string_value = "closed")]
    Closed,
}

/// Posting direction (`transaction_kind`).
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_kind")]
pub enum TransactionKind {
    /// Decreases the balance; stored amount is negative.
    #[sea_orm(string_value = "debit")]
    Debit,
    /// Increases the balance; stored amount is positive.
    #[sea_orm(string_value = "credit")]
    Credit,
}

impl From<ledger::AccountType> for AccountType {
    fn from(value: ledger::AccountType) -> Self {
        match value {
            ledger::AccountType::Checking => Self::Checking,
            ledger::AccountType::Savings => Self::Savings,
        }
    }
}

impl From<AccountType> for ledger::AccountType {
    fn from(value: AccountType) -> Self {
        match value {
            AccountType::Checking => Self::Checking,
            AccountType::Savings => Self::Savings,
        }
    }
}

impl From<ledger::AccountStatus> for AccountStatus {
    fn from(value: ledger::AccountStatus) -> Self {
        match value {
            ledger::AccountStatus::Open => Self::Open,
            ledger::AccountStatus::Closed => Self::Closed,
        }
    }
}

impl From<AccountStatus> for ledger::AccountStatus {
    fn from(value: AccountStatus) -> Self {
        match value {
            AccountStatus::Open => Self::Open,
            AccountStatus::Closed => Self::Closed,
        }
    }
}

impl From<ledger::TransactionKind> for TransactionKind {
    fn from(value: ledger::TransactionKind) -> Self {
        match value {
            ledger::TransactionKind::Debit => Self::Debit,
            ledger::TransactionKind::Credit => Self::Credit,
        }
    }
}

impl From<TransactionKind> for ledger::TransactionKind {
    fn from(value: TransactionKind) -> Self {
        match value {
            TransactionKind::Debit => Self::Debit,
            TransactionKind::Credit => Self::Credit,
        }
    }
}
