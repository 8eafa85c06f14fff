//! Decimal money helpers.

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use std::str::FromStr;

use super::error::FinanceError;

/// Decimal places kept on quoted prices.
pub const PRICE_SCALE: u32 = 4;

/// Formats an amount as US dollars: `$1,234.56`, `-$3.10`.
pub fn format_usd(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.2}", rounded.abs());
    let (whole, frac) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-${grouped}.{frac}")
    } else {
        format!("${grouped}.{frac}")
    }
}

/// Converts a provider price into a decimal.
pub fn price_from_f64(price: f64) -> Result<Decimal, FinanceError> {
    if !price.is_finite() || price < 0.0 {
        return Err(FinanceError::QuoteService {
            reason: format!("invalid price {price}"),
        });
    }
    Decimal::from_f64(price)
        .map(|d| d.round_dp(PRICE_SCALE).normalize())
        .ok_or_else(|| FinanceError::QuoteService {
            reason: format!("price {price} out of range"),
        })
}

/// Parses a stored or configured decimal amount.
pub fn parse_decimal(raw: &str) -> Result<Decimal, FinanceError> {
    Decimal::from_str(raw.trim()).map_err(|e| FinanceError::DatabaseQuery {
        reason: format!("invalid decimal {raw:?}: {e}"),
    })
}
