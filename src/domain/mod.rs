//! Core domain types and rules.

pub mod account;
pub mod error;
pub mod ledger;
pub mod money;
pub mod portfolio;
pub mod quote;
pub mod trade;
