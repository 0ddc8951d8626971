//! The transaction processor.
//!
//! Every ledger mutation flows through this component: it validates the
//! request, checks account state and funds against a fresh read, and commits
//! through the store's optimistic compare-and-swap, retrying a bounded number
//! of times under contention. No other code path writes balances or appends
//! transactions.

use rand::Rng;
use rust_decimal::Decimal;
use saldra_shared::config::LedgerConfig;
use saldra_shared::types::{AccountId, Currency, PageRequest, UserId};

use super::account::Account;
use super::balance::{BalanceAudit, next_balance, replay};
use super::error::{LedgerError, StoreError};
use super::store::{LedgerStore, ScanOrder, ScanRange};
use super::transaction::Transaction;
use super::types::{AccountType, PostingInput};
use super::validation::validate_posting;

/// Tunables for the commit protocol and history queries.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Maximum commit attempts per posting before giving up with a conflict.
    pub max_commit_retries: u32,
    /// Base backoff between attempts, in milliseconds. Attempt `n` waits
    /// `base * n` plus a random jitter of up to `base`.
    pub retry_backoff_ms: u64,
    /// Upper bound for history page sizes; larger requests are clamped.
    pub max_history_page_size: u32,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            max_commit_retries: 5,
            retry_backoff_ms: 10,
            max_history_page_size: 100,
        }
    }
}

impl From<&LedgerConfig> for ProcessorConfig {
    fn from(config: &LedgerConfig) -> Self {
        Self {
            max_commit_retries: config.max_commit_retries,
            retry_backoff_ms: config.retry_backoff_ms,
            max_history_page_size: config.max_history_page_size,
        }
    }
}

/// One page of an account's transaction history.
#[derive(Debug, Clone)]
pub struct HistoryPage {
    /// Transactions in the requested order.
    pub transactions: Vec<Transaction>,
    /// Effective page number (1-indexed).
    pub page: u32,
    /// Effective page size after clamping.
    pub per_page: u32,
    /// Total transactions on the account.
    pub total: u64,
    /// True if later pages exist.
    pub has_more: bool,
}

/// The posting engine, generic over its storage backend.
#[derive(Debug)]
pub struct TransactionProcessor<S> {
    store: S,
    config: ProcessorConfig,
}

impl<S: LedgerStore> TransactionProcessor<S> {
    /// Creates a processor with default configuration.
    pub fn new(store: S) -> Self {
        Self::with_config(store, ProcessorConfig::default())
    }

    /// Creates a processor with explicit configuration.
    pub fn with_config(store: S, config: ProcessorConfig) -> Self {
        Self { store, config }
    }

    /// Opens a new account with a zero balance at version 0.
    pub async fn open_account(
        &self,
        user_id: UserId,
        account_type: AccountType,
        currency: Currency,
    ) -> Result<Account, LedgerError> {
        let account = Account::open(user_id, account_type, currency);
        self.store.insert_account(&account).await?;
        Ok(account)
    }

    /// Looks up an account.
    pub async fn account(&self, account_id: AccountId) -> Result<Account, LedgerError> {
        self.store
            .find_account(account_id)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(account_id.into_inner()))
    }

    /// Lists all accounts owned by a user.
    pub async fn accounts_for_owner(&self, user_id: UserId) -> Result<Vec<Account>, LedgerError> {
        Ok(self.store.accounts_for_owner(user_id).await?)
    }

    /// Posts a debit or credit against an account.
    ///
    /// Validates the request, resolves idempotency-key replays, and then
    /// runs the optimistic commit loop: fresh account read, closed-state and
    /// overdraft checks against that read, compare-and-swap commit. A version
    /// conflict discards the attempt and retries after a short jittered
    /// backoff; exhausting the bound surfaces [`LedgerError::Conflict`].
    ///
    /// On success exactly one transaction row exists and the account balance
    /// and version advanced exactly once.
    pub async fn post(&self, input: PostingInput) -> Result<Transaction, LedgerError> {
        validate_posting(&input)?;
        let signed_amount = input.kind.signed_amount(input.amount);

        if let Some(key) = &input.idempotency_key
            && let Some(existing) = self
                .store
                .find_transaction_by_idempotency_key(input.account_id, key)
                .await?
        {
            return resolve_idempotency_hit(&input, signed_amount, existing);
        }

        let mut attempt = 1u32;
        loop {
            let account = self.account(input.account_id).await?;
            if account.is_closed() {
                return Err(LedgerError::AccountClosed(input.account_id.into_inner()));
            }

            // Overdraft check runs inside the loop, against the balance the
            // commit below will be conditioned on.
            let candidate = next_balance(account.balance, signed_amount);
            if candidate < Decimal::ZERO {
                return Err(LedgerError::InsufficientFunds {
                    account_id: input.account_id.into_inner(),
                    balance: account.balance,
                    amount: input.amount,
                });
            }

            let transaction = Transaction::record(
                input.account_id,
                signed_amount,
                input.kind,
                input.description.clone(),
                candidate,
                input.idempotency_key.clone(),
            );

            match self
                .store
                .commit_posting(input.account_id, account.version, candidate, &transaction)
                .await
            {
                Ok(()) => return Ok(transaction),
                Err(StoreError::VersionConflict { .. })
                    if attempt < self.config.max_commit_retries =>
                {
                    self.backoff(attempt).await;
                    attempt += 1;
                }
                Err(StoreError::VersionConflict { .. }) => {
                    return Err(LedgerError::Conflict(input.account_id.into_inner()));
                }
                Err(StoreError::DuplicateIdempotencyKey { .. }) => {
                    // Lost a race against a request carrying the same key;
                    // resolve against whatever that request committed.
                    if let Some(key) = &input.idempotency_key
                        && let Some(existing) = self
                            .store
                            .find_transaction_by_idempotency_key(input.account_id, key)
                            .await?
                    {
                        return resolve_idempotency_hit(&input, signed_amount, existing);
                    }
                    return Err(LedgerError::DuplicatePosting(input.account_id.into_inner()));
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Closes an account. Terminal: a closed account rejects postings and
    /// cannot be reopened.
    pub async fn close_account(&self, account_id: AccountId) -> Result<Account, LedgerError> {
        let mut attempt = 1u32;
        loop {
            let account = self.account(account_id).await?;
            if account.is_closed() {
                return Err(LedgerError::AccountClosed(account_id.into_inner()));
            }

            match self.store.close_account(account_id, account.version).await {
                Ok(closed) => return Ok(closed),
                Err(StoreError::VersionConflict { .. })
                    if attempt < self.config.max_commit_retries =>
                {
                    self.backoff(attempt).await;
                    attempt += 1;
                }
                Err(StoreError::VersionConflict { .. }) => {
                    return Err(LedgerError::Conflict(account_id.into_inner()));
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Returns one page of the account's transaction history.
    ///
    /// Ordering is stable by `(created_at, id)`; the page size is clamped to
    /// the configured maximum.
    pub async fn history(
        &self,
        account_id: AccountId,
        page: PageRequest,
        order: ScanOrder,
    ) -> Result<HistoryPage, LedgerError> {
        self.account(account_id).await?;

        let page = page.clamped(self.config.max_history_page_size);
        let range = ScanRange {
            offset: page.offset(),
            limit: page.limit(),
            order,
        };

        let transactions = self.store.transactions_for_account(account_id, range).await?;
        let total = self.store.transaction_count(account_id).await?;
        let has_more = page.offset() + transactions.len() as u64 < total;

        Ok(HistoryPage {
            transactions,
            page: page.page,
            per_page: page.per_page,
            total,
            has_more,
        })
    }

    /// Recomputes the balance from the full log and compares it to the
    /// materialized value.
    pub async fn audit_balance(&self, account_id: AccountId) -> Result<BalanceAudit, LedgerError> {
        let account = self.account(account_id).await?;
        let transactions = self
            .store
            .transactions_for_account(account_id, ScanRange::all())
            .await?;
        let recomputed = replay(&transactions);

        Ok(BalanceAudit::new(
            account_id,
            account.balance,
            recomputed,
            account.version,
            transactions.len() as u64,
        ))
    }

    async fn backoff(&self, attempt: u32) {
        let base = self.config.retry_backoff_ms;
        let jitter = rand::rng().random_range(0..=base);
        let delay = base.saturating_mul(u64::from(attempt)).saturating_add(jitter);
        tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
    }
}

/// Decides whether an idempotency-key hit is a safe replay or key misuse.
fn resolve_idempotency_hit(
    input: &PostingInput,
    signed_amount: Decimal,
    existing: Transaction,
) -> Result<Transaction, LedgerError> {
    if existing.matches_request(input.kind, signed_amount, &input.description) {
        Ok(existing)
    } else {
        Err(LedgerError::DuplicatePosting(input.account_id.into_inner()))
    }
}
