//! Postgres-backed ledger store.
//!
//! Implements the engine's storage contract on top of `SeaORM`. The commit
//! path is a single database transaction: a conditional `UPDATE ... WHERE
//! version = $expected` on the account followed by the transaction-row
//! insert. Zero rows updated means the version moved and nothing is written;
//! the partial unique index on `(account_id, idempotency_key)` turns key
//! races into a typed error.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};

use saldra_core::ledger::{Account, LedgerStore, ScanOrder, ScanRange, StoreError, Transaction};
use saldra_shared::types::{AccountId, Currency, TransactionId, UserId};

use crate::entities::sea_orm_active_enums::AccountStatus;
use crate::entities::{accounts, transactions};

/// Ledger store backed by Postgres.
///
/// Safe to share across server instances: all coordination happens through
/// the conditional update, never through in-process state.
#[derive(Debug, Clone)]
pub struct PostgresLedgerStore {
    db: DatabaseConnection,
}

impl PostgresLedgerStore {
    /// Creates a new Postgres ledger store.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Builds the error for a compare-and-swap that matched no rows.
    async fn stale_commit(&self, account_id: AccountId, expected: i64) -> StoreError {
        match accounts::Entity::find_by_id(account_id.into_inner())
            .one(&self.db)
            .await
        {
            Ok(Some(current)) => {
                tracing::debug!(
                    account_id = %account_id,
                    expected,
                    actual = current.version,
                    "commit lost the version race"
                );
                StoreError::VersionConflict {
                    account_id: account_id.into_inner(),
                    expected,
                    actual: current.version,
                }
            }
            Ok(None) => StoreError::AccountNotFound(account_id.into_inner()),
            Err(err) => map_db_err(err),
        }
    }
}

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        account_to_active_model(account)
            .insert(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn find_account(&self, account_id: AccountId) -> Result<Option<Account>, StoreError> {
        accounts::Entity::find_by_id(account_id.into_inner())
            .one(&self.db)
            .await
            .map_err(map_db_err)?
            .map(account_from_model)
            .transpose()
    }

    async fn accounts_for_owner(&self, user_id: UserId) -> Result<Vec<Account>, StoreError> {
        accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id.into_inner()))
            .order_by_asc(accounts::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(account_from_model)
            .collect()
    }

    async fn commit_posting(
        &self,
        account_id: AccountId,
        expected_version: i64,
        new_balance: Decimal,
        transaction: &Transaction,
    ) -> Result<(), StoreError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        let updated = accounts::Entity::update_many()
            .col_expr(accounts::Column::Balance, Expr::value(new_balance))
            .col_expr(
                accounts::Column::Version,
                Expr::col(accounts::Column::Version).add(1),
            )
            .col_expr(accounts::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(accounts::Column::Id.eq(account_id.into_inner()))
            .filter(accounts::Column::Version.eq(expected_version))
            .exec(&txn)
            .await
            .map_err(map_db_err)?;

        if updated.rows_affected == 0 {
            txn.rollback().await.map_err(map_db_err)?;
            return Err(self.stale_commit(account_id, expected_version).await);
        }

        match transaction_to_active_model(transaction).insert(&txn).await {
            Ok(_) => {
                txn.commit().await.map_err(map_db_err)?;
                Ok(())
            }
            // Dropping the open transaction rolls the balance update back.
            Err(err) if is_idempotency_violation(&err) => {
                Err(StoreError::DuplicateIdempotencyKey {
                    account_id: account_id.into_inner(),
                })
            }
            Err(err) => Err(map_db_err(err)),
        }
    }

    async fn close_account(
        &self,
        account_id: AccountId,
        expected_version: i64,
    ) -> Result<Account, StoreError> {
        let now = Utc::now();

        let updated = accounts::Entity::update_many()
            .col_expr(accounts::Column::Status, AccountStatus::Closed.as_enum())
            .col_expr(accounts::Column::ClosedAt, Expr::value(Some(now)))
            .col_expr(
                accounts::Column::Version,
                Expr::col(accounts::Column::Version).add(1),
            )
            .col_expr(accounts::Column::UpdatedAt, Expr::value(now))
            .filter(accounts::Column::Id.eq(account_id.into_inner()))
            .filter(accounts::Column::Version.eq(expected_version))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        if updated.rows_affected == 0 {
            return Err(self.stale_commit(account_id, expected_version).await);
        }

        let model = accounts::Entity::find_by_id(account_id.into_inner())
            .one(&self.db)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| StoreError::AccountNotFound(account_id.into_inner()))?;
        account_from_model(model)
    }

    async fn find_transaction_by_idempotency_key(
        &self,
        account_id: AccountId,
        key: &str,
    ) -> Result<Option<Transaction>, StoreError> {
        transactions::Entity::find()
            .filter(transactions::Column::AccountId.eq(account_id.into_inner()))
            .filter(transactions::Column::IdempotencyKey.eq(key))
            .one(&self.db)
            .await
            .map_err(map_db_err)
            .map(|model| model.map(transaction_from_model))
    }

    async fn transactions_for_account(
        &self,
        account_id: AccountId,
        range: ScanRange,
    ) -> Result<Vec<Transaction>, StoreError> {
        let mut query = transactions::Entity::find()
            .filter(transactions::Column::AccountId.eq(account_id.into_inner()));

        query = match range.order {
            ScanOrder::Ascending => query
                .order_by_asc(transactions::Column::CreatedAt)
                .order_by_asc(transactions::Column::Id),
            ScanOrder::Descending => query
                .order_by_desc(transactions::Column::CreatedAt)
                .order_by_desc(transactions::Column::Id),
        };

        // Postgres LIMIT is a signed bigint.
        let limit = range.limit.min(u64::MAX >> 1);

        let models = query
            .offset(range.offset)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(models.into_iter().map(transaction_from_model).collect())
    }

    async fn transaction_count(&self, account_id: AccountId) -> Result<u64, StoreError> {
        transactions::Entity::find()
            .filter(transactions::Column::AccountId.eq(account_id.into_inner()))
            .count(&self.db)
            .await
            .map_err(map_db_err)
    }
}

// ============================================================================
// Model Mapping
// ============================================================================

fn map_db_err(err: DbErr) -> StoreError {
    StoreError::Backend(err.to_string())
}

fn is_idempotency_violation(err: &DbErr) -> bool {
    matches!(
        err.sql_err(),
        Some(SqlErr::UniqueConstraintViolation(message))
            if message.contains("uq_transactions_account_idempotency_key")
    )
}

fn account_from_model(model: accounts::Model) -> Result<Account, StoreError> {
    let currency = model
        .currency
        .parse::<Currency>()
        .map_err(StoreError::Backend)?;

    Ok(Account {
        id: AccountId::from_uuid(model.id),
        user_id: UserId::from_uuid(model.user_id),
        account_type: model.account_type.into(),
        currency,
        balance: model.balance,
        version: model.version,
        status: model.status.into(),
        closed_at: model.closed_at.map(|t| t.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

fn account_to_active_model(account: &Account) -> accounts::ActiveModel {
    accounts::ActiveModel {
        id: Set(account.id.into_inner()),
        user_id: Set(account.user_id.into_inner()),
        account_type: Set(account.account_type.into()),
        currency: Set(account.currency.to_string()),
        balance: Set(account.balance),
        version: Set(account.version),
        status: Set(account.status.into()),
        closed_at: Set(account.closed_at.map(Into::into)),
        created_at: Set(account.created_at.into()),
        updated_at: Set(account.updated_at.into()),
    }
}

fn transaction_from_model(model: transactions::Model) -> Transaction {
    Transaction {
        id: TransactionId::from_uuid(model.id),
        account_id: AccountId::from_uuid(model.account_id),
        amount: model.amount,
        kind: model.kind.into(),
        description: model.description,
        created_at: model.created_at.with_timezone(&Utc),
        balance_after: model.balance_after,
        idempotency_key: model.idempotency_key,
    }
}

fn transaction_to_active_model(transaction: &Transaction) -> transactions::ActiveModel {
    transactions::ActiveModel {
        id: Set(transaction.id.into_inner()),
        account_id: Set(transaction.account_id.into_inner()),
        amount: Set(transaction.amount),
        kind: Set(transaction.kind.into()),
        description: Set(transaction.description.clone()),
        balance_after: Set(transaction.balance_after),
        idempotency_key: Set(transaction.idempotency_key.clone()),
        created_at: Set(transaction.created_at.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use saldra_core::ledger::{AccountType, TransactionKind};

    #[test]
    fn test_account_model_round_trip() {
        let account = Account::open(UserId::new(), AccountType::Checking, Currency::Usd);
        let active = account_to_active_model(&account);

        let model = accounts::Model {
            id: active.id.unwrap(),
            user_id: active.user_id.unwrap(),
            account_type: active.account_type.unwrap(),
            currency: active.currency.unwrap(),
            balance: active.balance.unwrap(),
            version: active.version.unwrap(),
            status: active.status.unwrap(),
            closed_at: active.closed_at.unwrap(),
            created_at: active.created_at.unwrap(),
            updated_at: active.updated_at.unwrap(),
        };

        let restored = account_from_model(model).unwrap();
        assert_eq!(restored.id, account.id);
        assert_eq!(restored.user_id, account.user_id);
        assert_eq!(restored.currency, Currency::Usd);
        assert_eq!(restored.balance, account.balance);
        assert_eq!(restored.version, 0);
        assert!(!restored.is_closed());
    }

    #[test]
    fn test_transaction_model_round_trip() {
        let transaction = Transaction::record(
            AccountId::new(),
            dec!(-25.00),
            TransactionKind::Debit,
            "coffee".to_string(),
            dec!(75.00),
            Some("key-9".to_string()),
        );
        let active = transaction_to_active_model(&transaction);

        let model = transactions::Model {
            id: active.id.unwrap(),
            account_id: active.account_id.unwrap(),
            amount: active.amount.unwrap(),
            kind: active.kind.unwrap(),
            description: active.description.unwrap(),
            balance_after: active.balance_after.unwrap(),
            idempotency_key: active.idempotency_key.unwrap(),
            created_at: active.created_at.unwrap(),
        };

        let restored = transaction_from_model(model);
        assert_eq!(restored, transaction);
    }

    #[test]
    fn test_unknown_currency_is_a_backend_error() {
        let account = Account::open(UserId::new(), AccountType::Savings, Currency::Eur);
        let active = account_to_active_model(&account);

        let model = accounts::Model {
            id: active.id.unwrap(),
            user_id: active.user_id.unwrap(),
            account_type: active.account_type.unwrap(),
            currency: "XXX".to_string(),
            balance: active.balance.unwrap(),
            version: active.version.unwrap(),
            status: active.status.unwrap(),
            closed_at: active.closed_at.unwrap(),
            created_at: active.created_at.unwrap(),
            updated_at: active.updated_at.unwrap(),
        };

        assert!(matches!(
            account_from_model(model),
            Err(StoreError::Backend(_))
        ));
    }
}
