//! Core ledger engine for Saldra.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and the posting engine live here.
//!
//! # Modules
//!
//! - `ledger` - Accounts, transactions, balance math, and the posting engine
//! - `auth` - Password hashing

pub mod auth;
pub mod ledger;
