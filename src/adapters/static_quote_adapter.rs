//! Fixed-price quote table for offline use and tests.
//!
//! Entries come from the `[quotes]` config section as
//! `SYMBOL = Company Name|price`.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::error::FinanceError;
use crate::domain::money::parse_decimal;
use crate::domain::quote::Quote;
use crate::ports::config_port::ConfigPort;
use crate::ports::quote_port::QuotePort;

#[derive(Default)]
pub struct StaticQuoteAdapter {
    quotes: RwLock<HashMap<String, Quote>>,
}

impl StaticQuoteAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quote(self, symbol: &str, name: &str, price: Decimal) -> Self {
        self.set_quote(symbol, name, price);
        self
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, FinanceError> {
        let adapter = Self::new();
        for key in config.section_keys("quotes") {
            let raw = config.get_string("quotes", &key).unwrap_or_default();
            let invalid = |reason: &str| FinanceError::ConfigInvalid {
                section: "quotes".into(),
                key: key.clone(),
                reason: reason.to_string(),
            };
            let (name, price) = raw
                .rsplit_once('|')
                .ok_or_else(|| invalid("expected `Company Name|price`"))?;
            let price = parse_decimal(price).map_err(|_| invalid("price is not a number"))?;
            if price.is_sign_negative() {
                return Err(invalid("price must not be negative"));
            }
            adapter.set_quote(&key, name.trim(), price);
        }
        Ok(adapter)
    }

    /// Inserts or reprices a symbol.
    pub fn set_quote(&self, symbol: &str, name: &str, price: Decimal) {
        let symbol = symbol.to_uppercase();
        let quote = Quote::new(symbol.clone(), name, price);
        self.quotes
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(symbol, quote);
    }

    /// Delists a symbol; later lookups return `None`.
    pub fn remove_quote(&self, symbol: &str) -> Option<Quote> {
        self.quotes
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&symbol.to_uppercase())
    }

    pub fn len(&self) -> usize {
        self.quotes
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl QuotePort for StaticQuoteAdapter {
    async fn lookup(&self, symbol: &str) -> Result<Option<Quote>, FinanceError> {
        let quotes = self
            .quotes
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(quotes.get(&symbol.to_uppercase()).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn loads_quotes_from_config() {
        let config = FileConfigAdapter::from_string(
            "[quotes]\nAAPL = Apple Inc.|150.25\nbrk.b = Berkshire Hathaway | 410\n",
        )
        .unwrap();
        let adapter = StaticQuoteAdapter::from_config(&config).unwrap();
        assert_eq!(adapter.len(), 2);

        let aapl = adapter.lookup("aapl").await.unwrap().unwrap();
        assert_eq!(aapl.symbol, "AAPL");
        assert_eq!(aapl.name, "Apple Inc.");
        assert_eq!(aapl.price, dec!(150.25));

        let brk = adapter.lookup("BRK.B").await.unwrap().unwrap();
        assert_eq!(brk.name, "Berkshire Hathaway");
        assert_eq!(brk.price, dec!(410));
    }

    #[test]
    fn malformed_entry_is_a_config_error() {
        let config = FileConfigAdapter::from_string("[quotes]\nAAPL = 150.25\n").unwrap();
        match StaticQuoteAdapter::from_config(&config) {
            Err(FinanceError::ConfigInvalid { section, key, .. }) => {
                assert_eq!(section, "quotes");
                assert_eq!(key, "aapl");
            }
            Err(other) => panic!("expected ConfigInvalid, got: {other}"),
            Ok(_) => panic!("expected error, got Ok"),
        }
    }

    #[test]
    fn missing_section_gives_empty_table() {
        let config = FileConfigAdapter::from_string("[web]\nlisten = x\n").unwrap();
        assert!(StaticQuoteAdapter::from_config(&config).unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_symbol_is_none() {
        let adapter = StaticQuoteAdapter::new().with_quote("AAPL", "Apple", dec!(1));
        assert!(adapter.lookup("MSFT").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_quote_reprices() {
        let adapter = StaticQuoteAdapter::new().with_quote("AAPL", "Apple", dec!(1));
        adapter.set_quote("aapl", "Apple", dec!(2));
        assert_eq!(adapter.lookup("AAPL").await.unwrap().unwrap().price, dec!(2));
    }

    #[tokio::test]
    async fn removed_symbol_is_none() {
        let adapter = StaticQuoteAdapter::new().with_quote("AAPL", "Apple", dec!(1));
        assert!(adapter.remove_quote("aapl").is_some());
        assert!(adapter.lookup("AAPL").await.unwrap().is_none());
        assert!(adapter.remove_quote("AAPL").is_none());
    }
}
