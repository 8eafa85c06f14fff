//! Append-only transaction ledger and its reconciliation against holdings.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use super::money::format_usd;
use super::portfolio::Holding;
use super::trade::TradeKind;

/// Timestamp format used in the `transactions.date` column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub id: i64,
    pub user_id: i64,
    pub kind: TradeKind,
    pub name: String,
    pub symbol: String,
    pub price: Decimal,
    pub shares: i64,
    pub executed_at: NaiveDateTime,
}

impl LedgerEntry {
    pub fn display_price(&self) -> String {
        format_usd(self.price)
    }

    pub fn display_time(&self) -> String {
        self.executed_at.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Net shares per symbol implied by the ledger.
pub fn reconcile(entries: &[LedgerEntry]) -> BTreeMap<String, i64> {
    let mut net: BTreeMap<String, i64> = BTreeMap::new();
    for entry in entries {
        let signed = match entry.kind {
            TradeKind::Buy => entry.shares,
            TradeKind::Sell => -entry.shares,
        };
        *net.entry(entry.symbol.clone()).or_insert(0) += signed;
    }
    net
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discrepancy {
    pub symbol: String,
    pub ledger_shares: i64,
    pub portfolio_shares: i64,
}

/// Symbols whose portfolio row disagrees with the ledger.
///
/// A symbol missing from the portfolio counts as zero shares, so a fully sold
/// position with no row is consistent.
pub fn audit(entries: &[LedgerEntry], holdings: &[Holding]) -> Vec<Discrepancy> {
    let ledger = reconcile(entries);
    let mut portfolio: BTreeMap<String, i64> = holdings
        .iter()
        .map(|h| (h.symbol.clone(), h.shares))
        .collect();

    let mut out = Vec::new();
    for (symbol, ledger_shares) in &ledger {
        let portfolio_shares = portfolio.remove(symbol).unwrap_or(0);
        if portfolio_shares != *ledger_shares {
            out.push(Discrepancy {
                symbol: symbol.clone(),
                ledger_shares: *ledger_shares,
                portfolio_shares,
            });
        }
    }
    for (symbol, portfolio_shares) in portfolio {
        if portfolio_shares != 0 {
            out.push(Discrepancy {
                symbol,
                ledger_shares: 0,
                portfolio_shares,
            });
        }
    }
    out
}
