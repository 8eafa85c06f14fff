//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::iex_quote_adapter::IexQuoteAdapter;
use crate::adapters::sqlite_adapter::SqliteAdapter;
use crate::adapters::static_quote_adapter::StaticQuoteAdapter;
use crate::adapters::web::{AppState, build_router};
use crate::domain::account::Account;
use crate::domain::error::FinanceError;
use crate::domain::ledger::{Discrepancy, audit};
use crate::ports::account_port::AccountPort;
use crate::ports::config_port::ConfigPort;
use crate::ports::ledger_port::LedgerPort;
use crate::ports::quote_port::QuotePort;

/// Prefix for environment variables that override config values,
/// e.g. `PAPERTRADE_QUOTE_API_KEY`.
pub const ENV_PREFIX: &str = "PAPERTRADE";

const DEFAULT_LISTEN: &str = "127.0.0.1:5000";

#[derive(Parser, Debug)]
#[command(name = "papertrade", about = "Simulated stock trading web app")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the web server
    Serve {
        #[arg(short, long)]
        config: PathBuf,
        /// Overrides [web] listen
        #[arg(long)]
        listen: Option<SocketAddr>,
    },
    /// Create the database schema
    InitDb {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Check every portfolio against its transaction ledger
    Audit {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Serve { config, listen } => run_serve(&config, listen),
        Command::InitDb { config } => run_init_db(&config),
        Command::Audit { config } => run_audit(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path)
        .map(|c| c.with_env_prefix(ENV_PREFIX))
        .map_err(|e| {
            let err = FinanceError::ConfigParse {
                file: path.display().to_string(),
                reason: e.to_string(),
            };
            eprintln!("error: {err}");
            ExitCode::from(&err)
        })
}

/// `RUST_LOG` wins over `[log] level`.
fn init_logging(config: &dyn ConfigPort) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let level = config
        .get_string("log", "level")
        .unwrap_or_else(|| "info".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init();
}

/// Opens the store from `[sqlite]` and makes sure the schema exists.
pub fn open_store(config: &dyn ConfigPort) -> Result<SqliteAdapter, FinanceError> {
    let store = SqliteAdapter::from_config(config)?;
    store.initialize_schema()?;
    Ok(store)
}

/// Picks the quote provider named by `[quote] provider` (default `iex`).
pub fn build_quote_port(config: &dyn ConfigPort) -> Result<Arc<dyn QuotePort>, FinanceError> {
    let provider = config
        .get_string("quote", "provider")
        .unwrap_or_else(|| "iex".to_string());
    match provider.trim().to_lowercase().as_str() {
        "iex" => Ok(Arc::new(IexQuoteAdapter::from_config(config)?)),
        "static" => {
            let table = StaticQuoteAdapter::from_config(config)?;
            if table.is_empty() {
                tracing::warn!("static quote provider has no [quotes] entries");
            }
            Ok(Arc::new(table))
        }
        other => Err(FinanceError::ConfigInvalid {
            section: "quote".into(),
            key: "provider".into(),
            reason: format!("unknown provider {other:?}, expected iex or static"),
        }),
    }
}

fn resolve_listen(
    config: &dyn ConfigPort,
    listen: Option<SocketAddr>,
) -> Result<SocketAddr, FinanceError> {
    if let Some(addr) = listen {
        return Ok(addr);
    }
    let raw = config
        .get_string("web", "listen")
        .unwrap_or_else(|| DEFAULT_LISTEN.to_string());
    raw.parse().map_err(|_| FinanceError::ConfigInvalid {
        section: "web".into(),
        key: "listen".into(),
        reason: format!("{raw:?} is not a socket address"),
    })
}

fn run_serve(config_path: &PathBuf, listen: Option<SocketAddr>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    init_logging(&config);
    tracing::info!(config = %config_path.display(), "loaded config");

    match serve(config, listen) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "server failed");
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn serve(config: FileConfigAdapter, listen: Option<SocketAddr>) -> Result<(), FinanceError> {
    let addr = resolve_listen(&config, listen)?;
    let store = Arc::new(open_store(&config)?);
    let quotes = build_quote_port(&config)?;

    let state = AppState {
        accounts: store.clone(),
        ledger: store.clone(),
        watchlist: store,
        quotes,
        config: Arc::new(config),
    };
    let router = build_router(state)?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(%addr, "listening");
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("shutting down");
            })
            .await
    })?;
    Ok(())
}

pub fn run_init_db(config_path: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    match open_store(&config) {
        Ok(_) => {
            eprintln!("Database schema ready");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Audits every account; only accounts with discrepancies are returned.
pub fn audit_accounts(
    accounts: &dyn AccountPort,
    ledger: &dyn LedgerPort,
) -> Result<Vec<(Account, Vec<Discrepancy>)>, FinanceError> {
    let mut findings = Vec::new();
    for account in accounts.list_accounts()? {
        let entries = ledger.entries(account.id)?;
        let holdings = ledger.holdings(account.id)?;
        let discrepancies = audit(&entries, &holdings);
        if !discrepancies.is_empty() {
            findings.push((account, discrepancies));
        }
    }
    Ok(findings)
}

pub fn run_audit(config_path: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let store = match open_store(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let findings = match audit_accounts(&store, &store) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if findings.is_empty() {
        println!("All portfolios match their ledgers");
        return ExitCode::SUCCESS;
    }
    for (account, discrepancies) in &findings {
        for d in discrepancies {
            println!(
                "{} (id {}): {} ledger={} portfolio={}",
                account.username, account.id, d.symbol, d.ledger_shares, d.portfolio_shares
            );
        }
    }
    ExitCode::from(6)
}
