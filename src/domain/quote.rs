//! Stock quotes returned by the lookup service.

use rust_decimal::Decimal;

use super::money::format_usd;

#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub symbol: String,
    pub name: String,
    pub price: Decimal,
}

impl Quote {
    pub fn new(symbol: impl Into<String>, name: impl Into<String>, price: Decimal) -> Self {
        Quote {
            symbol: symbol.into(),
            name: name.into(),
            price,
        }
    }

    pub fn display_price(&self) -> String {
        format_usd(self.price)
    }
}
