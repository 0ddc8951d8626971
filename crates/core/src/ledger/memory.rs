//! In-memory ledger store.
//!
//! Reference implementation of [`LedgerStore`]: a `RwLock`-guarded map with
//! the compare-and-swap performed under the write lock. Used by the core
//! test suite; production deployments use the Postgres store from the db
//! crate.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use saldra_shared::types::{AccountId, UserId};

use super::account::Account;
use super::error::StoreError;
use super::store::{LedgerStore, ScanOrder, ScanRange};
use super::transaction::Transaction;
use super::types::AccountStatus;

#[derive(Debug, Default)]
struct MemoryState {
    accounts: HashMap<AccountId, Account>,
    transactions: HashMap<AccountId, Vec<Transaction>>,
}

/// Thread-safe in-memory [`LedgerStore`].
///
/// Clones share the same underlying state.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedgerStore {
    inner: Arc<RwLock<MemoryState>>,
}

impl MemoryLedgerStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, MemoryState>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("state lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, MemoryState>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("state lock poisoned".to_string()))
    }
}

fn apply_range(mut transactions: Vec<Transaction>, range: ScanRange) -> Vec<Transaction> {
    transactions.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
    if range.order == ScanOrder::Descending {
        transactions.reverse();
    }

    let offset = usize::try_from(range.offset).unwrap_or(usize::MAX);
    let limit = usize::try_from(range.limit).unwrap_or(usize::MAX);
    transactions.into_iter().skip(offset).take(limit).collect()
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if state.accounts.contains_key(&account.id) {
            return Err(StoreError::Backend(format!(
                "account {} already exists",
                account.id
            )));
        }
        state.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn find_account(&self, account_id: AccountId) -> Result<Option<Account>, StoreError> {
        let state = self.read()?;
        Ok(state.accounts.get(&account_id).cloned())
    }

    async fn accounts_for_owner(&self, user_id: UserId) -> Result<Vec<Account>, StoreError> {
        let state = self.read()?;
        let mut accounts: Vec<Account> = state
            .accounts
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        accounts.sort_by_key(|a| a.id);
        Ok(accounts)
    }

    async fn commit_posting(
        &self,
        account_id: AccountId,
        expected_version: i64,
        new_balance: Decimal,
        transaction: &Transaction,
    ) -> Result<(), StoreError> {
        let mut state = self.write()?;

        let account = state
            .accounts
            .get(&account_id)
            .ok_or(StoreError::AccountNotFound(account_id.into_inner()))?;

        if account.version != expected_version {
            return Err(StoreError::VersionConflict {
                account_id: account_id.into_inner(),
                expected: expected_version,
                actual: account.version,
            });
        }

        if let Some(key) = &transaction.idempotency_key {
            let duplicate = state
                .transactions
                .get(&account_id)
                .is_some_and(|log| log.iter().any(|t| t.idempotency_key.as_ref() == Some(key)));
            if duplicate {
                return Err(StoreError::DuplicateIdempotencyKey {
                    account_id: account_id.into_inner(),
                });
            }
        }

        // Version check passed under the write lock; apply all three effects.
        let account = state
            .accounts
            .get_mut(&account_id)
            .ok_or(StoreError::AccountNotFound(account_id.into_inner()))?;
        account.balance = new_balance;
        account.version += 1;
        account.updated_at = Utc::now();

        state
            .transactions
            .entry(account_id)
            .or_default()
            .push(transaction.clone());

        Ok(())
    }

    async fn close_account(
        &self,
        account_id: AccountId,
        expected_version: i64,
    ) -> Result<Account, StoreError> {
        let mut state = self.write()?;

        let account = state
            .accounts
            .get_mut(&account_id)
            .ok_or(StoreError::AccountNotFound(account_id.into_inner()))?;

        if account.version != expected_version {
            return Err(StoreError::VersionConflict {
                account_id: account_id.into_inner(),
                expected: expected_version,
                actual: account.version,
            });
        }

        let now = Utc::now();
        account.status = AccountStatus::Closed;
        account.closed_at = Some(now);
        account.version += 1;
        account.updated_at = now;

        Ok(account.clone())
    }

    async fn find_transaction_by_idempotency_key(
        &self,
        account_id: AccountId,
        key: &str,
    ) -> Result<Option<Transaction>, StoreError> {
        let state = self.read()?;
        Ok(state.transactions.get(&account_id).and_then(|log| {
            log.iter()
                .find(|t| t.idempotency_key.as_deref() == Some(key))
                .cloned()
        }))
    }

    async fn transactions_for_account(
        &self,
        account_id: AccountId,
        range: ScanRange,
    ) -> Result<Vec<Transaction>, StoreError> {
        let state = self.read()?;
        let transactions = state
            .transactions
            .get(&account_id)
            .cloned()
            .unwrap_or_default();
        Ok(apply_range(transactions, range))
    }

    async fn transaction_count(&self, account_id: AccountId) -> Result<u64, StoreError> {
        let state = self.read()?;
        Ok(state
            .transactions
            .get(&account_id)
            .map_or(0, |log| log.len() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::types::{AccountType, TransactionKind};
    use rust_decimal_macros::dec;
    use saldra_shared::types::Currency;

    async fn open_account(store: &MemoryLedgerStore) -> Account {
        let account = Account::open(UserId::new(), AccountType::Checking, Currency::Usd);
        store.insert_account(&account).await.unwrap();
        account
    }

    fn make_transaction(account_id: AccountId, amount: Decimal, key: Option<&str>) -> Transaction {
        let kind = if amount.is_sign_negative() {
            TransactionKind::Debit
        } else {
            TransactionKind::Credit
        };
        Transaction::record(
            account_id,
            amount,
            kind,
            "test".to_string(),
            amount,
            key.map(String::from),
        )
    }

    #[tokio::test]
    async fn test_commit_rejects_stale_version() {
        let store = MemoryLedgerStore::new();
        let account = open_account(&store).await;

        let txn = make_transaction(account.id, dec!(100.00), None);
        store
            .commit_posting(account.id, 0, dec!(100.00), &txn)
            .await
            .unwrap();

        // Second commit against the already-consumed version 0.
        let stale = make_transaction(account.id, dec!(50.00), None);
        let result = store.commit_posting(account.id, 0, dec!(150.00), &stale).await;

        assert!(matches!(
            result,
            Err(StoreError::VersionConflict {
                expected: 0,
                actual: 1,
                ..
            })
        ));

        // The failed commit left no trace.
        let stored = store.find_account(account.id).await.unwrap().unwrap();
        assert_eq!(stored.balance, dec!(100.00));
        assert_eq!(stored.version, 1);
        assert_eq!(store.transaction_count(account.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_commit_rejects_duplicate_idempotency_key() {
        let store = MemoryLedgerStore::new();
        let account = open_account(&store).await;

        let txn = make_transaction(account.id, dec!(10.00), Some("key-1"));
        store
            .commit_posting(account.id, 0, dec!(10.00), &txn)
            .await
            .unwrap();

        let replay = make_transaction(account.id, dec!(10.00), Some("key-1"));
        let result = store.commit_posting(account.id, 1, dec!(20.00), &replay).await;

        assert!(matches!(
            result,
            Err(StoreError::DuplicateIdempotencyKey { .. })
        ));
        let stored = store.find_account(account.id).await.unwrap().unwrap();
        assert_eq!(stored.balance, dec!(10.00));
        assert_eq!(stored.version, 1);
    }

    #[tokio::test]
    async fn test_close_is_a_versioned_mutation() {
        let store = MemoryLedgerStore::new();
        let account = open_account(&store).await;

        let closed = store.close_account(account.id, 0).await.unwrap();
        assert_eq!(closed.status, AccountStatus::Closed);
        assert_eq!(closed.version, 1);
        assert!(closed.closed_at.is_some());

        let result = store.close_account(account.id, 0).await;
        assert!(matches!(result, Err(StoreError::VersionConflict { .. })));
    }

    #[tokio::test]
    async fn test_scan_windows_tile_the_log() {
        let store = MemoryLedgerStore::new();
        let account = open_account(&store).await;

        for i in 0..5i64 {
            let txn = make_transaction(account.id, Decimal::new(100 + i, 2), None);
            store
                .commit_posting(account.id, i, Decimal::ZERO, &txn)
                .await
                .unwrap();
        }

        let full = store
            .transactions_for_account(account.id, ScanRange::all())
            .await
            .unwrap();
        assert_eq!(full.len(), 5);
        for pair in full.windows(2) {
            assert!((pair[0].created_at, pair[0].id) < (pair[1].created_at, pair[1].id));
        }

        let mut tiled = Vec::new();
        for offset in [0u64, 2, 4] {
            let window = store
                .transactions_for_account(
                    account.id,
                    ScanRange {
                        offset,
                        limit: 2,
                        order: ScanOrder::Ascending,
                    },
                )
                .await
                .unwrap();
            tiled.extend(window);
        }
        assert_eq!(tiled, full);

        let newest_first = store
            .transactions_for_account(
                account.id,
                ScanRange {
                    offset: 0,
                    limit: 5,
                    order: ScanOrder::Descending,
                },
            )
            .await
            .unwrap();
        let mut reversed = full;
        reversed.reverse();
        assert_eq!(newest_first, reversed);
    }

    #[tokio::test]
    async fn test_find_by_idempotency_key() {
        let store = MemoryLedgerStore::new();
        let account = open_account(&store).await;

        let txn = make_transaction(account.id, dec!(25.00), Some("lookup-key"));
        store
            .commit_posting(account.id, 0, dec!(25.00), &txn)
            .await
            .unwrap();

        let found = store
            .find_transaction_by_idempotency_key(account.id, "lookup-key")
            .await
            .unwrap();
        assert_eq!(found.map(|t| t.id), Some(txn.id));

        let missing = store
            .find_transaction_by_idempotency_key(account.id, "other-key")
            .await
            .unwrap();
        assert!(missing.is_none());
    }
}
