//! The ledger engine.
//!
//! This module implements the core posting functionality:
//! - Accounts with versioned, materialized balances
//! - Immutable transactions (the append-only log)
//! - Balance calculations (incremental and full recomputation)
//! - Business rule validation
//! - The storage contract and an in-memory reference store
//! - The transaction processor (validation, overdraft check, optimistic
//!   commit with bounded retries)

pub mod account;
pub mod balance;
pub mod error;
pub mod memory;
pub mod processor;
pub mod store;
pub mod transaction;
pub mod types;
pub mod validation;

#[cfg(test)]
mod processor_props;

pub use account::Account;
pub use balance::{BalanceAudit, next_balance, recompute, replay};
pub use error::{LedgerError, StoreError};
pub use memory::MemoryLedgerStore;
pub use processor::{HistoryPage, ProcessorConfig, TransactionProcessor};
pub use store::{LedgerStore, ScanOrder, ScanRange};
pub use transaction::Transaction;
pub use types::{AccountStatus, AccountType, PostingInput, TransactionKind};
pub use validation::validate_posting;
