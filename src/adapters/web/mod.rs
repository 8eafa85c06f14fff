//! Web server adapter.
//!
//! Axum router with server-rendered Askama pages. Sessions live in an
//! in-process store behind signed cookies; `axum-login` guards every page
//! except login, logout and registration.

mod auth;
mod error;
mod handlers;
mod templates;

pub use auth::{AuthSession, Backend, Credentials, SessionUser};
pub use error::WebError;
pub use handlers::*;
pub use templates::*;

use axum::{
    Router,
    http::{HeaderValue, header},
    routing::get,
};
use axum_login::{AuthManagerLayerBuilder, login_required};
use rust_decimal::Decimal;
use std::sync::Arc;
use tower_http::{services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, cookie::Key};

use crate::domain::error::FinanceError;
use crate::domain::money::parse_decimal;
use crate::ports::account_port::AccountPort;
use crate::ports::config_port::ConfigPort;
use crate::ports::ledger_port::LedgerPort;
use crate::ports::quote_port::QuotePort;
use crate::ports::watchlist_port::WatchlistPort;

/// Cash credited to a freshly registered account when unconfigured.
pub const DEFAULT_STARTING_CASH: &str = "10000.00";

pub struct AppState {
    pub accounts: Arc<dyn AccountPort + Send + Sync>,
    pub ledger: Arc<dyn LedgerPort + Send + Sync>,
    pub watchlist: Arc<dyn WatchlistPort + Send + Sync>,
    pub quotes: Arc<dyn QuotePort>,
    pub config: Arc<dyn ConfigPort + Send + Sync>,
}

impl AppState {
    pub fn starting_cash(&self) -> Result<Decimal, FinanceError> {
        let raw = self
            .config
            .get_string("account", "starting_cash")
            .unwrap_or_else(|| DEFAULT_STARTING_CASH.to_string());
        let cash = parse_decimal(&raw).map_err(|_| FinanceError::ConfigInvalid {
            section: "account".into(),
            key: "starting_cash".into(),
            reason: format!("{raw:?} is not a decimal amount"),
        })?;
        if cash.is_sign_negative() {
            return Err(FinanceError::ConfigInvalid {
                section: "account".into(),
                key: "starting_cash".into(),
                reason: "must not be negative".into(),
            });
        }
        Ok(cash)
    }
}

/// Signing key from `[auth] session_secret` (hex, at least 64 bytes).
/// Without one a random key is used and sessions die with the process.
fn session_key(config: &dyn ConfigPort) -> Result<Key, FinanceError> {
    let invalid = |reason: String| FinanceError::ConfigInvalid {
        section: "auth".into(),
        key: "session_secret".into(),
        reason,
    };
    match config.get_string("auth", "session_secret") {
        Some(secret) => {
            let bytes = hex::decode(secret.trim()).map_err(|e| invalid(e.to_string()))?;
            Key::try_from(bytes.as_slice())
                .map_err(|_| invalid("must decode to at least 64 bytes".into()))
        }
        None => {
            tracing::warn!("no [auth] session_secret configured, using a random key");
            Ok(Key::generate())
        }
    }
}

pub fn build_router(state: AppState) -> Result<Router, FinanceError> {
    let config = state.config.clone();
    state.starting_cash()?;

    let lifetime = config.get_int("auth", "session_lifetime", 0);
    let expiry = if lifetime > 0 {
        Expiry::OnInactivity(time::Duration::seconds(lifetime))
    } else {
        Expiry::OnSessionEnd
    };
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(config.get_bool("web", "secure_cookies", false))
        .with_expiry(expiry)
        .with_signed(session_key(&*config)?);

    let backend = Backend::new(state.accounts.clone());
    let auth_layer = AuthManagerLayerBuilder::new(backend, session_layer).build();

    let static_dir = config
        .get_string("web", "static_dir")
        .unwrap_or_else(|| "static".to_string());

    let protected = Router::new()
        .route("/", get(handlers::index).post(handlers::index))
        .route("/buy", get(handlers::buy_form).post(handlers::buy))
        .route("/sell", get(handlers::sell_form).post(handlers::sell))
        .route("/quote", get(handlers::quote).post(handlers::add_quote))
        .route(
            "/delete",
            get(handlers::delete_redirect).post(handlers::delete),
        )
        .route("/history", get(handlers::history))
        .route_layer(login_required!(Backend, login_url = "/login"));

    let public = Router::new()
        .route("/login", get(handlers::login_form).post(handlers::login))
        .route("/logout", get(handlers::logout).post(handlers::logout))
        .route(
            "/register",
            get(handlers::register_form).post(handlers::register),
        )
        .nest_service("/static", ServeDir::new(static_dir));

    Ok(protected
        .merge(public)
        .fallback(handlers::not_found)
        .layer(auth_layer)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::EXPIRES,
            HeaderValue::from_static("0"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::PRAGMA,
            HeaderValue::from_static("no-cache"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state)))
}
