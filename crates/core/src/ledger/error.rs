//! Ledger error types.
//!
//! Two layers: [`StoreError`] is the storage contract (its version-conflict
//! signal drives the retry loop and never reaches callers), while
//! [`LedgerError`] is the outward taxonomy with stable codes and HTTP
//! statuses.

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Errors reported by a [`super::store::LedgerStore`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The expected account version no longer matches the stored one.
    ///
    /// This is the optimistic-commit conflict signal; the processor retries
    /// from a fresh read and callers never see it directly.
    #[error("version conflict for account {account_id}: expected {expected}, found {actual}")]
    VersionConflict {
        /// The account whose commit was rejected.
        account_id: Uuid,
        /// The version the caller read before computing the commit.
        expected: i64,
        /// The version actually stored.
        actual: i64,
    },

    /// A transaction with this idempotency key already exists for the account.
    #[error("idempotency key already used for account {account_id}")]
    DuplicateIdempotencyKey {
        /// The account the key is scoped to.
        account_id: Uuid,
    },

    /// The account does not exist.
    #[error("account not found: {0}")]
    AccountNotFound(Uuid),

    /// The storage backend failed.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Posting amount must be a positive magnitude.
    #[error("Posting amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    /// Description must not be empty.
    #[error("Description must not be empty")]
    EmptyDescription,

    /// Description exceeds the allowed length.
    #[error("Description exceeds {max} characters")]
    DescriptionTooLong {
        /// Maximum allowed length.
        max: usize,
    },

    /// Idempotency key is empty or too long.
    #[error("Idempotency key must be between 1 and {max} characters")]
    InvalidIdempotencyKey {
        /// Maximum allowed length.
        max: usize,
    },

    // ========== Account Errors ==========
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),

    /// Account is closed and rejects postings.
    #[error("Account {0} is closed")]
    AccountClosed(Uuid),

    // ========== Funds Errors ==========
    /// The debit would drive the balance negative.
    #[error(
        "Insufficient funds in account {account_id}: balance {balance}, attempted debit {amount}"
    )]
    InsufficientFunds {
        /// The target account.
        account_id: Uuid,
        /// The balance at the time of the check.
        balance: Decimal,
        /// The debit magnitude that was rejected.
        amount: Decimal,
    },

    // ========== Concurrency Errors ==========
    /// The commit retry bound was exhausted under contention.
    #[error("Concurrent modification of account {0}, please retry")]
    Conflict(Uuid),

    // ========== Idempotency Errors ==========
    /// An idempotency key was reused with a different payload.
    #[error("Idempotency key reused with a different payload for account {0}")]
    DuplicatePosting(Uuid),

    // ========== Storage Errors ==========
    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NonPositiveAmount(_) => "NON_POSITIVE_AMOUNT",
            Self::EmptyDescription => "EMPTY_DESCRIPTION",
            Self::DescriptionTooLong { .. } => "DESCRIPTION_TOO_LONG",
            Self::InvalidIdempotencyKey { .. } => "INVALID_IDEMPOTENCY_KEY",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::AccountClosed(_) => "ACCOUNT_CLOSED",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::Conflict(_) => "CONFLICT",
            Self::DuplicatePosting(_) => "DUPLICATE_POSTING",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::NonPositiveAmount(_)
            | Self::EmptyDescription
            | Self::DescriptionTooLong { .. }
            | Self::InvalidIdempotencyKey { .. } => 400,

            // 404 Not Found
            Self::AccountNotFound(_) => 404,

            // 409 Conflict - concurrency and idempotency-key misuse
            Self::Conflict(_) | Self::DuplicatePosting(_) => 409,

            // 422 Unprocessable - business rules
            Self::AccountClosed(_) | Self::InsufficientFunds { .. } => 422,

            // 500 Internal Server Error
            Self::Storage(_) => 500,
        }
    }

    /// Returns true if the caller may safely retry the identical request.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            // The retry loop consumes version conflicts; reaching here means
            // the bound was exhausted.
            StoreError::VersionConflict { account_id, .. } => Self::Conflict(account_id),
            StoreError::DuplicateIdempotencyKey { account_id } => {
                Self::DuplicatePosting(account_id)
            }
            StoreError::AccountNotFound(id) => Self::AccountNotFound(id),
            StoreError::Backend(msg) => Self::Storage(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            LedgerError::NonPositiveAmount(dec!(0)).error_code(),
            "NON_POSITIVE_AMOUNT"
        );
        assert_eq!(LedgerError::EmptyDescription.error_code(), "EMPTY_DESCRIPTION");
        assert_eq!(
            LedgerError::AccountNotFound(Uuid::nil()).error_code(),
            "ACCOUNT_NOT_FOUND"
        );
        assert_eq!(
            LedgerError::AccountClosed(Uuid::nil()).error_code(),
            "ACCOUNT_CLOSED"
        );
        assert_eq!(
            LedgerError::InsufficientFunds {
                account_id: Uuid::nil(),
                balance: dec!(600.00),
                amount: dec!(700.00),
            }
            .error_code(),
            "INSUFFICIENT_FUNDS"
        );
        assert_eq!(LedgerError::Conflict(Uuid::nil()).error_code(), "CONFLICT");
        assert_eq!(
            LedgerError::DuplicatePosting(Uuid::nil()).error_code(),
            "DUPLICATE_POSTING"
        );
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(LedgerError::NonPositiveAmount(dec!(-1)).http_status_code(), 400);
        assert_eq!(LedgerError::EmptyDescription.http_status_code(), 400);
        assert_eq!(
            LedgerError::AccountNotFound(Uuid::nil()).http_status_code(),
            404
        );
        assert_eq!(
            LedgerError::AccountClosed(Uuid::nil()).http_status_code(),
            422
        );
        assert_eq!(
            LedgerError::InsufficientFunds {
                account_id: Uuid::nil(),
                balance: dec!(0),
                amount: dec!(1),
            }
            .http_status_code(),
            422
        );
        assert_eq!(LedgerError::Conflict(Uuid::nil()).http_status_code(), 409);
        assert_eq!(
            LedgerError::DuplicatePosting(Uuid::nil()).http_status_code(),
            409
        );
        assert_eq!(
            LedgerError::Storage("test".to_string()).http_status_code(),
            500
        );
    }

    #[test]
    fn test_retryable_errors() {
        assert!(LedgerError::Conflict(Uuid::nil()).is_retryable());
        assert!(!LedgerError::DuplicatePosting(Uuid::nil()).is_retryable());
        assert!(!LedgerError::InsufficientFunds {
            account_id: Uuid::nil(),
            balance: dec!(0),
            amount: dec!(1),
        }
        .is_retryable());
        assert!(!LedgerError::EmptyDescription.is_retryable());
    }

    #[test]
    fn test_store_error_conversion() {
        let account_id = Uuid::new_v4();

        let err: LedgerError = StoreError::VersionConflict {
            account_id,
            expected: 3,
            actual: 5,
        }
        .into();
        assert!(matches!(err, LedgerError::Conflict(id) if id == account_id));

        let err: LedgerError = StoreError::DuplicateIdempotencyKey { account_id }.into();
        assert!(matches!(err, LedgerError::DuplicatePosting(id) if id == account_id));

        let err: LedgerError = StoreError::AccountNotFound(account_id).into();
        assert!(matches!(err, LedgerError::AccountNotFound(id) if id == account_id));
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::InsufficientFunds {
            account_id: Uuid::nil(),
            balance: dec!(600.00),
            amount: dec!(700.00),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient funds in account 00000000-0000-0000-0000-000000000000: \
             balance 600.00, attempted debit 700.00"
        );

        let err = StoreError::VersionConflict {
            account_id: Uuid::nil(),
            expected: 1,
            actual: 2,
        };
        assert_eq!(
            err.to_string(),
            "version conflict for account 00000000-0000-0000-0000-000000000000: \
             expected 1, found 2"
        );
    }
}
