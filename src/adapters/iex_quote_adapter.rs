//! IEX Cloud quote lookup over HTTP.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

use crate::domain::error::FinanceError;
use crate::domain::money::price_from_f64;
use crate::domain::quote::Quote;
use crate::ports::config_port::ConfigPort;
use crate::ports::quote_port::QuotePort;

pub const DEFAULT_BASE_URL: &str = "https://cloud.iexapis.com/stable";

pub struct IexQuoteAdapter {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IexQuote {
    symbol: String,
    company_name: Option<String>,
    latest_price: Option<f64>,
}

/// Tickers are letters and digits plus the few separators exchanges use.
fn is_plausible_symbol(symbol: &str) -> bool {
    !symbol.is_empty()
        && symbol.len() <= 16
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='))
}

fn quote_from_response(body: IexQuote) -> Result<Option<Quote>, FinanceError> {
    let Some(price) = body.latest_price else {
        return Ok(None);
    };
    let name = body.company_name.unwrap_or_else(|| body.symbol.clone());
    Ok(Some(Quote::new(body.symbol, name, price_from_f64(price)?)))
}

impl IexQuoteAdapter {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, FinanceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("papertrade/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FinanceError::QuoteService {
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Reads `[quote] base_url, api_key, timeout_secs`. The key falls back to
    /// the `API_KEY` environment variable.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, FinanceError> {
        let api_key = config
            .get_string("quote", "api_key")
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var("API_KEY").ok().filter(|k| !k.is_empty()))
            .ok_or_else(|| FinanceError::ConfigMissing {
                section: "quote".into(),
                key: "api_key".into(),
            })?;
        let base_url = config
            .get_string("quote", "base_url")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let timeout_secs = config.get_double("quote", "timeout_secs", 10.0);
        if timeout_secs.is_nan() || timeout_secs <= 0.0 {
            return Err(FinanceError::ConfigInvalid {
                section: "quote".into(),
                key: "timeout_secs".into(),
                reason: "must be positive".into(),
            });
        }
        Self::new(base_url, api_key, Duration::from_secs_f64(timeout_secs))
    }

    fn quote_url(&self, symbol: &str) -> String {
        format!("{}/stock/{}/quote", self.base_url, symbol)
    }
}

#[async_trait]
impl QuotePort for IexQuoteAdapter {
    async fn lookup(&self, symbol: &str) -> Result<Option<Quote>, FinanceError> {
        if !is_plausible_symbol(symbol) {
            return Ok(None);
        }

        let resp = self
            .client
            .get(self.quote_url(symbol))
            .query(&[("token", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| FinanceError::QuoteService {
                reason: e.without_url().to_string(),
            })?;

        match resp.status() {
            StatusCode::NOT_FOUND => {
                tracing::debug!(symbol, "quote lookup: unknown symbol");
                return Ok(None);
            }
            status if !status.is_success() => {
                tracing::warn!(symbol, %status, "quote lookup failed");
                return Err(FinanceError::QuoteService {
                    reason: format!("HTTP {status}"),
                });
            }
            _ => {}
        }

        let body: IexQuote = resp.json().await.map_err(|e| FinanceError::QuoteService {
            reason: e.without_url().to_string(),
        })?;
        quote_from_response(body)
    }
}
