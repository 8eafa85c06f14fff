#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use http_body_util::BodyExt;
use papertrade::adapters::sqlite_adapter::SqliteAdapter;
use papertrade::adapters::static_quote_adapter::StaticQuoteAdapter;
use papertrade::adapters::web::{AppState, build_router};
use papertrade::ports::config_port::ConfigPort;
use papertrade::ports::quote_port::QuotePort;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tower::ServiceExt;

pub const PASSWORD: &str = "correct horse";

pub struct MockConfigPort;

impl ConfigPort for MockConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        match (section, key) {
            ("auth", "session_secret") => Some("01".repeat(64)),
            ("account", "starting_cash") => Some("10000.00".to_string()),
            _ => None,
        }
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        match (section, key) {
            ("auth", "session_lifetime") => 3600,
            _ => default,
        }
    }

    fn get_double(&self, _section: &str, _key: &str, default: f64) -> f64 {
        default
    }

    fn get_bool(&self, _section: &str, _key: &str, default: bool) -> bool {
        default
    }
}

pub fn fresh_store() -> Arc<SqliteAdapter> {
    let store = SqliteAdapter::in_memory().unwrap();
    store.initialize_schema().unwrap();
    Arc::new(store)
}

pub fn sample_quotes() -> Arc<StaticQuoteAdapter> {
    Arc::new(
        StaticQuoteAdapter::new()
            .with_quote("AAPL", "Apple Inc.", dec!(150.00))
            .with_quote("MSFT", "Microsoft Corporation", dec!(400.25))
            .with_quote("NFLX", "Netflix Inc.", dec!(480.10)),
    )
}

/// A router plus handles on the store and quote table behind it.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<SqliteAdapter>,
    pub quotes: Arc<StaticQuoteAdapter>,
}

impl TestApp {
    pub fn new() -> Self {
        let quotes = sample_quotes();
        Self::with_quote_port(quotes.clone(), quotes)
    }

    /// Routes lookups through `port`; `quotes` stays available for repricing.
    pub fn with_quote_port(quotes: Arc<StaticQuoteAdapter>, port: Arc<dyn QuotePort>) -> Self {
        let store = fresh_store();
        let state = AppState {
            accounts: store.clone(),
            ledger: store.clone(),
            watchlist: store.clone(),
            quotes: port,
            config: Arc::new(MockConfigPort),
        };
        let router = build_router(state).unwrap();
        TestApp {
            router,
            store,
            quotes,
        }
    }

    pub fn reprice(&self, symbol: &str, name: &str, price: Decimal) {
        self.quotes.set_quote(symbol, name, price);
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post(&self, uri: &str, form: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(form.to_string())).unwrap())
            .await
    }

    pub async fn register(&self, username: &str, password: &str) -> Response<Body> {
        let form = format!(
            "username={username}&password={}&confirmation={}",
            encode(password),
            encode(password)
        );
        self.post("/register", &form, None).await
    }

    pub async fn login(&self, username: &str, password: &str) -> Response<Body> {
        let form = format!("username={username}&password={}", encode(password));
        self.post("/login", &form, None).await
    }

    /// Registers and logs in, returning the session cookie header value.
    pub async fn signed_in(&self, username: &str) -> String {
        let registered = self.register(username, PASSWORD).await;
        assert_eq!(registered.status(), StatusCode::SEE_OTHER);
        let response = self.login(username, PASSWORD).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let cookie = cookie_header(&response);
        assert!(!cookie.is_empty(), "login should set a session cookie");
        cookie
    }

    pub async fn buy(&self, cookie: &str, symbol: &str, shares: &str) -> Response<Body> {
        self.post("/buy", &format!("symbol={symbol}&shares={shares}"), Some(cookie))
            .await
    }

    pub async fn sell(&self, cookie: &str, symbol: &str, shares: &str) -> Response<Body> {
        self.post("/sell", &format!("symbol={symbol}&shares={shares}"), Some(cookie))
            .await
    }
}

/// Minimal form encoding for test inputs: spaces only.
pub fn encode(value: &str) -> String {
    value.replace(' ', "+")
}

pub fn cookie_header(response: &Response<Body>) -> String {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(|sc| sc.split(';').next().unwrap_or("").to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8_lossy(&bytes).into_owned()
}
