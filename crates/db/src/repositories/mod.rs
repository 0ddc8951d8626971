//! Repository implementations for data access.

pub mod ledger;
pub mod user;

pub use ledger::PostgresLedgerStore;
pub use user::UserRepository;
