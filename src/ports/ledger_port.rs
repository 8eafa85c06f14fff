//! Portfolio and transaction ledger storage port.

use chrono::NaiveDateTime;

use crate::domain::error::FinanceError;
use crate::domain::ledger::LedgerEntry;
use crate::domain::portfolio::Holding;
use crate::domain::trade::TradePlan;

pub trait LedgerPort {
    /// Current holdings, ordered by symbol.
    fn holdings(&self, user_id: i64) -> Result<Vec<Holding>, FinanceError>;

    /// Shares held in `symbol`, zero when there is no portfolio row.
    fn shares_held(&self, user_id: i64, symbol: &str) -> Result<i64, FinanceError>;

    /// Distinct symbols the user has ever traded.
    fn traded_symbols(&self, user_id: i64) -> Result<Vec<String>, FinanceError>;

    /// Ledger entries in execution order.
    fn entries(&self, user_id: i64) -> Result<Vec<LedgerEntry>, FinanceError>;

    /// Appends the ledger entry, updates the portfolio row and sets the new
    /// cash balance as one unit.
    fn commit_trade(
        &self,
        user_id: i64,
        plan: &TradePlan,
        executed_at: NaiveDateTime,
    ) -> Result<LedgerEntry, FinanceError>;
}
