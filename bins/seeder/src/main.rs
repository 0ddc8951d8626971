//! Database seeder for Saldra development and testing.
//!
//! Seeds a demo user with two accounts and a handful of postings for local
//! development. Postings go through the transaction processor, so seeded
//! data satisfies the same balance and version invariants as live traffic.
//!
//! Usage: cargo run --bin seeder

use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use std::str::FromStr;
use uuid::Uuid;

use saldra_core::auth::hash_password;
use saldra_core::ledger::{AccountType, PostingInput, TransactionKind, TransactionProcessor};
use saldra_db::entities::users;
use saldra_db::{PostgresLedgerStore, connect};
use saldra_shared::types::{AccountId, Currency, UserId};

/// Demo user ID (consistent for all seeds)
const DEMO_USER_ID: &str = "00000000-0000-0000-0000-000000000001";
/// Demo credentials printed after seeding
const DEMO_EMAIL: &str = "demo@saldra.dev";
const DEMO_PASSWORD: &str = "demo-password";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = connect(&database_url)
        .await
        .expect("Failed to connect to database");

    println!("Seeding demo user...");
    seed_demo_user(&db).await;

    println!("Seeding demo accounts and postings...");
    seed_demo_ledger(&db).await;

    println!("Seeding complete!");
    println!("  Login with {DEMO_EMAIL} / {DEMO_PASSWORD}");
}

fn demo_user_id() -> Uuid {
    Uuid::parse_str(DEMO_USER_ID).unwrap()
}

/// Seeds the demo user with a real password hash so login works.
async fn seed_demo_user(db: &DatabaseConnection) {
    if users::Entity::find_by_id(demo_user_id())
        .one(db)
        .await
        .ok()
        .flatten()
        .is_some()
    {
        println!("  Demo user already exists, skipping...");
        return;
    }

    let password_hash = hash_password(DEMO_PASSWORD).expect("Failed to hash demo password");
    let now = chrono::Utc::now().into();

    let user = users::ActiveModel {
        id: Set(demo_user_id()),
        email: Set(DEMO_EMAIL.to_string()),
        password_hash: Set(password_hash),
        full_name: Set("Demo User".to_string()),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    };

    if let Err(e) = user.insert(db).await {
        eprintln!("Failed to insert demo user: {e}");
    } else {
        println!("  Created demo user: {DEMO_EMAIL}");
    }
}

/// Opens demo accounts and posts a starter history through the processor.
async fn seed_demo_ledger(db: &DatabaseConnection) {
    let ledger = TransactionProcessor::new(PostgresLedgerStore::new(db.clone()));
    let owner = UserId::from_uuid(demo_user_id());

    let existing = ledger
        .accounts_for_owner(owner)
        .await
        .expect("Failed to list demo accounts");
    if !existing.is_empty() {
        println!("  Demo accounts already exist, skipping...");
        return;
    }

    let checking = ledger
        .open_account(owner, AccountType::Checking, Currency::Usd)
        .await
        .expect("Failed to open demo checking account");
    let savings = ledger
        .open_account(owner, AccountType::Savings, Currency::Usd)
        .await
        .expect("Failed to open demo savings account");
    println!("  Opened accounts {} and {}", checking.id, savings.id);

    // Idempotency keys make a partial re-run safe
    let postings = [
        (checking.id, "2500.00", TransactionKind::Credit, "Salary", "seed-salary"),
        (checking.id, "120.50", TransactionKind::Debit, "Groceries", "seed-groceries"),
        (checking.id, "60.00", TransactionKind::Debit, "Utilities", "seed-utilities"),
        (savings.id, "1000.00", TransactionKind::Credit, "Opening deposit", "seed-opening"),
    ];

    for (account_id, amount, kind, description, key) in postings {
        seed_posting(&ledger, account_id, amount, kind, description, key).await;
    }
}

async fn seed_posting(
    ledger: &TransactionProcessor<PostgresLedgerStore>,
    account_id: AccountId,
    amount: &str,
    kind: TransactionKind,
    description: &str,
    key: &str,
) {
    let input = PostingInput {
        account_id,
        amount: Decimal::from_str(amount).expect("Invalid seed amount"),
        kind,
        description: description.to_string(),
        idempotency_key: Some(key.to_string()),
    };

    match ledger.post(input).await {
        Ok(transaction) => println!(
            "  Posted {} {} -> balance {}",
            description, transaction.amount, transaction.balance_after
        ),
        Err(e) => eprintln!("Failed to post {description}: {e}"),
    }
}
