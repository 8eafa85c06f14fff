//! HTML templates using Askama.
//!
//! Money is formatted before it reaches a template, so the structs carry
//! display strings rather than decimals.

use askama::Template;
use axum::response::{Html, IntoResponse, Response};

use crate::domain::ledger::LedgerEntry;
use crate::domain::money::format_usd;
use crate::domain::portfolio::ValuedHolding;

use super::WebError;

/// Renders a template into a 200 response.
pub fn render<T: Template>(template: &T) -> Result<Response, WebError> {
    template
        .render()
        .map(|html| Html(html).into_response())
        .map_err(|e| WebError::internal(format!("template error: {e}")))
}

pub struct HoldingRow {
    pub symbol: String,
    pub name: String,
    pub shares: i64,
    pub price: String,
    pub total: String,
}

impl From<&ValuedHolding> for HoldingRow {
    fn from(h: &ValuedHolding) -> Self {
        HoldingRow {
            symbol: h.symbol.clone(),
            name: h.name.clone(),
            shares: h.shares,
            price: format_usd(h.price),
            total: format_usd(h.total),
        }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub logged_in: bool,
    pub username: String,
    pub alert: Option<String>,
    pub holdings: Vec<HoldingRow>,
    pub cash: String,
    pub total: String,
}

#[derive(Template)]
#[template(path = "buy.html")]
pub struct BuyTemplate {
    pub logged_in: bool,
    pub symbol: String,
}

pub struct SymbolOption {
    pub symbol: String,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "sell.html")]
pub struct SellTemplate {
    pub logged_in: bool,
    pub symbols: Vec<SymbolOption>,
}

pub struct WatchRow {
    pub symbol: String,
    pub name: String,
    pub price: String,
}

#[derive(Template)]
#[template(path = "quote.html")]
pub struct QuoteTemplate {
    pub logged_in: bool,
    pub stocks: Vec<WatchRow>,
}

pub struct HistoryRow {
    pub kind: &'static str,
    pub name: String,
    pub symbol: String,
    pub price: String,
    pub shares: i64,
    pub date: String,
}

impl From<&LedgerEntry> for HistoryRow {
    fn from(entry: &LedgerEntry) -> Self {
        HistoryRow {
            kind: entry.kind.as_str(),
            name: entry.name.clone(),
            symbol: entry.symbol.clone(),
            price: entry.display_price(),
            shares: entry.shares,
            date: entry.display_time(),
        }
    }
}

#[derive(Template)]
#[template(path = "history.html")]
pub struct HistoryTemplate {
    pub logged_in: bool,
    pub transactions: Vec<HistoryRow>,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub logged_in: bool,
    pub next: String,
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub logged_in: bool,
}

#[derive(Template)]
#[template(path = "apology.html")]
pub struct ApologyTemplate<'a> {
    pub logged_in: bool,
    pub status: u16,
    pub message: &'a str,
}
