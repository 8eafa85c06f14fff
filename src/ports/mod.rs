//! Port traits (interfaces) the domain uses to reach the outside world.

pub mod account_port;
pub mod config_port;
pub mod ledger_port;
pub mod quote_port;
pub mod watchlist_port;
