//! Portfolio holdings and valuation.

use rust_decimal::Decimal;
use std::collections::HashMap;

use super::quote::Quote;
use super::trade::TradeKind;

/// Shares a user owns in one symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Holding {
    pub symbol: String,
    pub shares: i64,
}

/// New share count after a trade of `delta` shares.
///
/// With no prior row the delta itself becomes the count. The result is not
/// clamped; callers are expected to have checked that a sell is covered.
pub fn apply_trade(existing: Option<i64>, kind: TradeKind, delta: i64) -> i64 {
    match (existing, kind) {
        (Some(shares), TradeKind::Buy) => shares + delta,
        (Some(shares), TradeKind::Sell) => shares - delta,
        (None, _) => delta,
    }
}

/// A holding priced at the latest quote.
#[derive(Debug, Clone, PartialEq)]
pub struct ValuedHolding {
    pub symbol: String,
    pub name: String,
    pub shares: i64,
    pub price: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioSummary {
    pub holdings: Vec<ValuedHolding>,
    pub cash: Decimal,
    pub stock_value: Decimal,
}

impl PortfolioSummary {
    /// Values each holding at its quote. Holdings without a quote are skipped.
    pub fn value(holdings: &[Holding], quotes: &HashMap<String, Quote>, cash: Decimal) -> Self {
        let valued: Vec<ValuedHolding> = holdings
            .iter()
            .filter_map(|h| {
                quotes.get(&h.symbol).map(|q| ValuedHolding {
                    symbol: h.symbol.clone(),
                    name: q.name.clone(),
                    shares: h.shares,
                    price: q.price,
                    total: q.price * Decimal::from(h.shares),
                })
            })
            .collect();
        let stock_value = valued.iter().map(|v| v.total).sum();
        PortfolioSummary {
            holdings: valued,
            cash,
            stock_value,
        }
    }

    pub fn grand_total(&self) -> Decimal {
        self.cash + self.stock_value
    }
}
