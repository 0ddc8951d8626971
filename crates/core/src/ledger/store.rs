//! The ledger storage contract.
//!
//! The processor talks to storage exclusively through [`LedgerStore`]. The
//! in-memory implementation ([`super::memory::MemoryLedgerStore`]) defines
//! the reference semantics; the Postgres implementation lives in the db
//! crate.

use async_trait::async_trait;
use rust_decimal::Decimal;
use saldra_shared::types::{AccountId, UserId};

use super::account::Account;
use super::error::StoreError;
use super::transaction::Transaction;

/// Scan direction for transaction range queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanOrder {
    /// Oldest first.
    Ascending,
    /// Newest first.
    #[default]
    Descending,
}

/// An offset/limit window over an account's ordered transaction log.
#[derive(Debug, Clone, Copy)]
pub struct ScanRange {
    /// Rows to skip.
    pub offset: u64,
    /// Maximum rows to return.
    pub limit: u64,
    /// Scan direction.
    pub order: ScanOrder,
}

impl ScanRange {
    /// A window over the full log, oldest first.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            offset: 0,
            limit: u64::MAX,
            order: ScanOrder::Ascending,
        }
    }
}

/// Durable storage for accounts and their append-only transaction logs.
///
/// Implementations must guarantee that [`LedgerStore::commit_posting`] and
/// [`LedgerStore::close_account`] are atomic compare-and-swap operations on
/// the account version: they either apply completely (balance, version, and
/// log advance together) or not at all.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Persists a freshly opened account.
    async fn insert_account(&self, account: &Account) -> Result<(), StoreError>;

    /// Point lookup by account id.
    async fn find_account(&self, account_id: AccountId) -> Result<Option<Account>, StoreError>;

    /// All accounts owned by a user, oldest first.
    async fn accounts_for_owner(&self, user_id: UserId) -> Result<Vec<Account>, StoreError>;

    /// Atomically commits one posting.
    ///
    /// Only if the stored version still equals `expected_version`: sets the
    /// balance to `new_balance`, advances the version by one, and appends
    /// `transaction`, all as a single unit of work.
    ///
    /// # Errors
    ///
    /// [`StoreError::VersionConflict`] when the version moved,
    /// [`StoreError::DuplicateIdempotencyKey`] when the transaction carries a
    /// key already present on the account. Neither leaves partial state.
    async fn commit_posting(
        &self,
        account_id: AccountId,
        expected_version: i64,
        new_balance: Decimal,
        transaction: &Transaction,
    ) -> Result<(), StoreError>;

    /// Atomically marks an account closed, advancing its version.
    ///
    /// Returns the updated account.
    ///
    /// # Errors
    ///
    /// [`StoreError::VersionConflict`] when the version moved.
    async fn close_account(
        &self,
        account_id: AccountId,
        expected_version: i64,
    ) -> Result<Account, StoreError>;

    /// Looks up a transaction by its per-account idempotency key.
    async fn find_transaction_by_idempotency_key(
        &self,
        account_id: AccountId,
        key: &str,
    ) -> Result<Option<Transaction>, StoreError>;

    /// Ordered window over an account's transactions.
    ///
    /// Ordering is by `(created_at, id)` in the requested direction;
    /// concatenating consecutive windows reproduces the full log.
    async fn transactions_for_account(
        &self,
        account_id: AccountId,
        range: ScanRange,
    ) -> Result<Vec<Transaction>, StoreError>;

    /// Total number of transactions on an account.
    async fn transaction_count(&self, account_id: AccountId) -> Result<u64, StoreError>;
}
