//! Property tests driving the processor with random posting sequences
//! against an in-memory store and a simple reference model.

use proptest::prelude::*;
use rust_decimal::Decimal;
use saldra_shared::types::{Currency, PageRequest, UserId};

use super::memory::MemoryLedgerStore;
use super::processor::TransactionProcessor;
use super::store::ScanOrder;
use super::types::{AccountType, PostingInput, TransactionKind};

#[derive(Debug, Clone, Copy)]
struct Op {
    kind: TransactionKind,
    magnitude: Decimal,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    (any::<bool>(), 1i64..100_000i64).prop_map(|(is_credit, cents)| Op {
        kind: if is_credit {
            TransactionKind::Credit
        } else {
            TransactionKind::Debit
        },
        magnitude: Decimal::new(cents, 2),
    })
}

fn run<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// **Materialized balance always equals the replayed log**
    ///
    /// *For any* sequence of postings, some accepted and some rejected for
    /// insufficient funds, the stored balance matches a fold over the log,
    /// the version counts exactly the accepted postings, and rejections
    /// leave no trace.
    #[test]
    fn prop_balance_version_and_log_stay_consistent(
        ops in prop::collection::vec(op_strategy(), 1..20),
    ) {
        run(async move {
            let processor = TransactionProcessor::new(MemoryLedgerStore::new());
            let account = processor
                .open_account(UserId::new(), AccountType::Checking, Currency::Usd)
                .await
                .unwrap();

            let mut model_balance = Decimal::ZERO;
            let mut accepted = 0i64;

            for op in ops {
                let signed = op.kind.signed_amount(op.magnitude);
                let input = PostingInput::new(account.id, op.magnitude, op.kind, "prop");
                match processor.post(input).await {
                    Ok(transaction) => {
                        model_balance += signed;
                        accepted += 1;
                        prop_assert_eq!(transaction.amount, signed);
                        prop_assert_eq!(transaction.balance_after, model_balance);
                    }
                    Err(err) => {
                        // Only overdrafts may fail here, and only when the
                        // model agrees the funds are short.
                        prop_assert!(err.error_code() == "INSUFFICIENT_FUNDS");
                        prop_assert!(model_balance + signed < Decimal::ZERO);
                    }
                }
            }

            let stored = processor.account(account.id).await.unwrap();
            prop_assert_eq!(stored.balance, model_balance);
            prop_assert_eq!(stored.version, accepted);

            let audit = processor.audit_balance(account.id).await.unwrap();
            prop_assert!(audit.consistent);
            prop_assert_eq!(audit.transaction_count as i64, accepted);
            Ok(())
        })?;
    }

    /// **History pagination is lossless**
    ///
    /// *For any* accepted posting sequence and page size, walking the pages
    /// in order reconstructs the full log with no gaps or duplicates.
    #[test]
    fn prop_history_pages_reconstruct_the_log(
        ops in prop::collection::vec(op_strategy(), 1..20),
        per_page in 1u32..7,
    ) {
        run(async move {
            let processor = TransactionProcessor::new(MemoryLedgerStore::new());
            let account = processor
                .open_account(UserId::new(), AccountType::Savings, Currency::Usd)
                .await
                .unwrap();

            for op in ops {
                // Ignore overdraft rejections; accepted rows are what history serves.
                let _ = processor
                    .post(PostingInput::new(account.id, op.magnitude, op.kind, "prop"))
                    .await;
            }

            let full = processor
                .history(
                    account.id,
                    PageRequest { page: 1, per_page: 100 },
                    ScanOrder::Ascending,
                )
                .await
                .unwrap();

            let mut collected = Vec::new();
            let mut page = 1u32;
            loop {
                let result = processor
                    .history(account.id, PageRequest { page, per_page }, ScanOrder::Ascending)
                    .await
                    .unwrap();
                let done = !result.has_more;
                collected.extend(result.transactions);
                if done {
                    break;
                }
                page += 1;
            }

            prop_assert_eq!(collected, full.transactions);
            Ok(())
        })?;
    }
}
