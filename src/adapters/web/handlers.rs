//! HTTP request handlers for web adapter.

use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::account::{Registration, hash_password};
use crate::domain::error::FinanceError;
use crate::domain::money::format_usd;
use crate::domain::portfolio::{Holding, PortfolioSummary};
use crate::domain::quote::Quote;
use crate::domain::trade::{parse_shares, parse_symbol, plan_buy, plan_sell};

use super::auth::{AuthSession, Credentials, SessionUser};
use super::templates::{
    BuyTemplate, HistoryRow, HistoryTemplate, HoldingRow, IndexTemplate, LoginTemplate,
    QuoteTemplate, RegisterTemplate, SellTemplate, SymbolOption, WatchRow, render,
};
use super::{AppState, WebError};

fn current_user(auth: &AuthSession) -> Result<&SessionUser, WebError> {
    auth.user
        .as_ref()
        .ok_or_else(|| WebError::new(axum::http::StatusCode::UNAUTHORIZED, "not logged in"))
}

fn now() -> chrono::NaiveDateTime {
    chrono::Local::now().naive_local()
}

async fn require_quote(state: &AppState, symbol: &str) -> Result<Quote, FinanceError> {
    state
        .quotes
        .lookup(symbol)
        .await?
        .ok_or_else(|| FinanceError::UnknownSymbol {
            symbol: symbol.to_string(),
        })
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct AlertQuery {
    pub alert: Option<String>,
}

/// Portfolio page. Holdings the quote service no longer knows are priced at
/// their last traded price.
pub async fn index(
    State(state): State<Arc<AppState>>,
    auth: AuthSession,
    Query(query): Query<AlertQuery>,
) -> Result<Response, WebError> {
    let user = current_user(&auth)?;
    let account = state
        .accounts
        .find_by_id(user.id)?
        .ok_or_else(|| WebError::internal("account disappeared"))?;
    let holdings = state.ledger.holdings(user.id)?;

    let mut quotes: HashMap<String, Quote> = HashMap::with_capacity(holdings.len());
    let mut missing = Vec::new();
    for holding in &holdings {
        match state.quotes.lookup(&holding.symbol).await? {
            Some(quote) => {
                quotes.insert(holding.symbol.clone(), quote);
            }
            None => missing.push(holding.symbol.clone()),
        }
    }
    if !missing.is_empty() {
        tracing::warn!(?missing, "no live quote, using last traded price");
        for entry in state.ledger.entries(user.id)? {
            if missing.contains(&entry.symbol) {
                quotes.insert(
                    entry.symbol.clone(),
                    Quote::new(entry.symbol, entry.name, entry.price),
                );
            }
        }
    }

    let summary = PortfolioSummary::value(&holdings, &quotes, account.cash);
    let template = IndexTemplate {
        logged_in: true,
        username: account.username,
        alert: query.alert.filter(|a| !a.is_empty()),
        holdings: summary.holdings.iter().map(HoldingRow::from).collect(),
        cash: format_usd(summary.cash),
        total: format_usd(summary.grand_total()),
    };
    render(&template)
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct SymbolQuery {
    pub symbol: Option<String>,
}

pub async fn buy_form(Query(query): Query<SymbolQuery>) -> Result<Response, WebError> {
    render(&BuyTemplate {
        logged_in: true,
        symbol: query.symbol.unwrap_or_default().to_uppercase(),
    })
}

#[derive(Debug, serde::Deserialize)]
pub struct TradeForm {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub shares: String,
}

pub async fn buy(
    State(state): State<Arc<AppState>>,
    auth: AuthSession,
    Form(form): Form<TradeForm>,
) -> Result<Response, WebError> {
    let user = current_user(&auth)?;
    let symbol = parse_symbol(&form.symbol)?;
    let quote = require_quote(&state, &symbol).await?;
    let shares = parse_shares(&form.shares)?;

    let account = state
        .accounts
        .find_by_id(user.id)?
        .ok_or_else(|| WebError::internal("account disappeared"))?;
    let plan = plan_buy(account.cash, &quote, shares)?;
    state.ledger.commit_trade(user.id, &plan, now())?;

    tracing::info!(
        user_id = user.id,
        symbol = %plan.symbol,
        shares = plan.shares,
        price = %plan.price,
        "bought"
    );
    Ok(Redirect::to("/?alert=Bought!").into_response())
}

pub async fn sell_form(
    State(state): State<Arc<AppState>>,
    auth: AuthSession,
    Query(query): Query<SymbolQuery>,
) -> Result<Response, WebError> {
    let user = current_user(&auth)?;
    let requested = query.symbol.map(|s| s.to_uppercase());
    let symbols = state
        .ledger
        .traded_symbols(user.id)?
        .into_iter()
        .map(|symbol| SymbolOption {
            selected: requested.as_deref() == Some(symbol.as_str()),
            symbol,
        })
        .collect();
    render(&SellTemplate {
        logged_in: true,
        symbols,
    })
}

pub async fn sell(
    State(state): State<Arc<AppState>>,
    auth: AuthSession,
    Form(form): Form<TradeForm>,
) -> Result<Response, WebError> {
    let user = current_user(&auth)?;
    let symbol = parse_symbol(&form.symbol)?;
    let shares = parse_shares(&form.shares)?;

    let holding = Holding {
        shares: state.ledger.shares_held(user.id, &symbol)?,
        symbol,
    };
    if holding.shares <= 0 {
        return Err(FinanceError::NoHoldings {
            symbol: holding.symbol,
        }
        .into());
    }
    if shares > holding.shares {
        return Err(FinanceError::InsufficientShares {
            held: holding.shares,
            requested: shares,
        }
        .into());
    }

    let quote = require_quote(&state, &holding.symbol).await?;
    if quote.symbol != holding.symbol {
        tracing::warn!(
            held = %holding.symbol,
            quoted = %quote.symbol,
            "quote returned a different symbol"
        );
    }
    let account = state
        .accounts
        .find_by_id(user.id)?
        .ok_or_else(|| WebError::internal("account disappeared"))?;
    let plan = plan_sell(account.cash, &holding, &quote, shares)?;
    state.ledger.commit_trade(user.id, &plan, now())?;

    tracing::info!(
        user_id = user.id,
        symbol = %plan.symbol,
        shares = plan.shares,
        price = %plan.price,
        "sold"
    );
    Ok(Redirect::to("/?alert=Sold!").into_response())
}

pub async fn history(
    State(state): State<Arc<AppState>>,
    auth: AuthSession,
) -> Result<Response, WebError> {
    let user = current_user(&auth)?;
    let transactions = state
        .ledger
        .entries(user.id)?
        .iter()
        .map(HistoryRow::from)
        .collect();
    render(&HistoryTemplate {
        logged_in: true,
        transactions,
    })
}

/// Watchlist page with a live quote per symbol.
pub async fn quote(
    State(state): State<Arc<AppState>>,
    auth: AuthSession,
) -> Result<Response, WebError> {
    let user = current_user(&auth)?;
    let mut stocks = Vec::new();
    for symbol in state.watchlist.watched_symbols(user.id)? {
        let row = match state.quotes.lookup(&symbol).await? {
            Some(q) => WatchRow {
                price: q.display_price(),
                symbol: q.symbol,
                name: q.name,
            },
            None => WatchRow {
                name: "unavailable".to_string(),
                price: "N/A".to_string(),
                symbol,
            },
        };
        stocks.push(row);
    }
    render(&QuoteTemplate {
        logged_in: true,
        stocks,
    })
}

#[derive(Debug, serde::Deserialize)]
pub struct SymbolForm {
    #[serde(default)]
    pub symbol: String,
}

pub async fn add_quote(
    State(state): State<Arc<AppState>>,
    auth: AuthSession,
    Form(form): Form<SymbolForm>,
) -> Result<Response, WebError> {
    let user = current_user(&auth)?;
    let symbol = parse_symbol(&form.symbol)?;
    let quote = require_quote(&state, &symbol).await?;
    state.watchlist.watch(user.id, &quote.symbol)?;
    tracing::debug!(user_id = user.id, symbol = %quote.symbol, "watching");
    Ok(Redirect::to("/quote").into_response())
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    auth: AuthSession,
    Form(form): Form<SymbolForm>,
) -> Result<Response, WebError> {
    let user = current_user(&auth)?;
    if let Ok(symbol) = parse_symbol(&form.symbol) {
        state.watchlist.unwatch(user.id, &symbol)?;
    }
    Ok(Redirect::to("/quote").into_response())
}

pub async fn delete_redirect() -> Redirect {
    Redirect::to("/quote")
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

pub async fn login_form(Query(query): Query<NextQuery>) -> Result<Response, WebError> {
    render(&LoginTemplate {
        logged_in: false,
        next: query.next.unwrap_or_default(),
    })
}

#[derive(Debug, serde::Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub next: Option<String>,
}

/// Only same-site absolute paths are followed after login.
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path,
        _ => "/",
    }
}

pub async fn login(
    mut auth: AuthSession,
    Form(form): Form<LoginForm>,
) -> Result<Response, WebError> {
    if form.username.is_empty() {
        return Err(WebError::bad_request("must provide username"));
    }
    if form.password.is_empty() {
        return Err(WebError::bad_request("must provide password"));
    }

    let creds = Credentials {
        username: form.username,
        password: form.password,
    };
    let user = match auth.authenticate(creds).await {
        Ok(Some(user)) => user,
        Ok(None) => return Err(FinanceError::InvalidCredentials.into()),
        Err(e) => return Err(WebError::internal(e.to_string())),
    };

    auth.login(&user)
        .await
        .map_err(|e| WebError::internal(e.to_string()))?;
    tracing::info!(user_id = user.id, "logged in");

    Ok(Redirect::to(safe_next(form.next.as_deref())).into_response())
}

pub async fn logout(mut auth: AuthSession) -> Result<Response, WebError> {
    auth.logout()
        .await
        .map_err(|e| WebError::internal(e.to_string()))?;
    Ok(Redirect::to("/login").into_response())
}

pub async fn register_form() -> Result<Response, WebError> {
    render(&RegisterTemplate { logged_in: false })
}

#[derive(Debug, serde::Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirmation: String,
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Form(form): Form<RegisterForm>,
) -> Result<Response, WebError> {
    let registration = Registration::validate(&form.username, &form.password, &form.confirmation)?;
    if state
        .accounts
        .find_by_username(&registration.username)?
        .is_some()
    {
        return Err(FinanceError::UsernameTaken.into());
    }

    let password = registration.password;
    let hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| WebError::internal(e.to_string()))??;

    let user_id =
        state
            .accounts
            .create_account(&registration.username, &hash, state.starting_cash()?)?;
    tracing::info!(user_id, username = %registration.username, "registered");

    Ok(Redirect::to("/login").into_response())
}

pub async fn not_found() -> WebError {
    WebError::not_found("Page not found")
}
