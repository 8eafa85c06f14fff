//! Quote watchlist storage port.

use crate::domain::error::FinanceError;

pub trait WatchlistPort {
    fn watched_symbols(&self, user_id: i64) -> Result<Vec<String>, FinanceError>;

    /// Fails with [`FinanceError::AlreadyWatching`] on a duplicate.
    fn watch(&self, user_id: i64, symbol: &str) -> Result<(), FinanceError>;

    /// Returns whether a row was removed.
    fn unwatch(&self, user_id: i64, symbol: &str) -> Result<bool, FinanceError>;
}
