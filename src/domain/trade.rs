//! Trade validation and planning.
//!
//! A trade is planned purely from the user's current cash, their holding and a
//! fresh quote. The resulting [`TradePlan`] is what the ledger store commits.

use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

use super::error::FinanceError;
use super::portfolio::Holding;
use super::quote::Quote;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradeKind {
    Buy,
    Sell,
}

impl TradeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeKind::Buy => "BUY",
            TradeKind::Sell => "SELL",
        }
    }
}

impl fmt::Display for TradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeKind {
    type Err = FinanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BUY" => Ok(TradeKind::Buy),
            "SELL" => Ok(TradeKind::Sell),
            other => Err(FinanceError::DatabaseQuery {
                reason: format!("unknown trade type {other:?}"),
            }),
        }
    }
}

/// A validated trade ready to be written to the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct TradePlan {
    pub kind: TradeKind,
    pub symbol: String,
    pub name: String,
    pub price: Decimal,
    pub shares: i64,
    /// Cash balance after the trade settles.
    pub new_cash: Decimal,
}

impl TradePlan {
    pub fn amount(&self) -> Decimal {
        self.price * Decimal::from(self.shares)
    }
}

/// Normalises a submitted ticker symbol.
pub fn parse_symbol(raw: &str) -> Result<String, FinanceError> {
    let symbol = raw.trim();
    if symbol.is_empty() {
        return Err(FinanceError::validation("Symbol can't be empty"));
    }
    Ok(symbol.to_uppercase())
}

/// Parses a submitted share count, which must be a positive integer.
pub fn parse_shares(raw: &str) -> Result<i64, FinanceError> {
    let shares: i64 = raw
        .trim()
        .parse()
        .map_err(|_| FinanceError::validation("Shares must be an integer"))?;
    if shares <= 0 {
        return Err(FinanceError::validation("Shares must be a positive integer"));
    }
    Ok(shares)
}

pub fn plan_buy(cash: Decimal, quote: &Quote, shares: i64) -> Result<TradePlan, FinanceError> {
    if shares <= 0 {
        return Err(FinanceError::validation("Shares must be a positive integer"));
    }
    let cost = quote.price * Decimal::from(shares);
    if cost > cash {
        return Err(FinanceError::InsufficientCash);
    }
    Ok(TradePlan {
        kind: TradeKind::Buy,
        symbol: quote.symbol.clone(),
        name: quote.name.clone(),
        price: quote.price,
        shares,
        new_cash: cash - cost,
    })
}

/// Sells out of `holding` at the quoted price.
///
/// The plan is keyed on the holding's symbol, not the quote's, so a provider
/// that answers with a renamed ticker still debits the position being sold.
pub fn plan_sell(
    cash: Decimal,
    holding: &Holding,
    quote: &Quote,
    shares: i64,
) -> Result<TradePlan, FinanceError> {
    let held = holding.shares;
    if held <= 0 {
        return Err(FinanceError::NoHoldings {
            symbol: holding.symbol.clone(),
        });
    }
    if shares <= 0 {
        return Err(FinanceError::validation("Shares must be a positive integer"));
    }
    if shares > held {
        return Err(FinanceError::InsufficientShares {
            held,
            requested: shares,
        });
    }
    let proceeds = quote.price * Decimal::from(shares);
    Ok(TradePlan {
        kind: TradeKind::Sell,
        symbol: holding.symbol.clone(),
        name: quote.name.clone(),
        price: quote.price,
        shares,
        new_cash: cash + proceeds,
    })
}
