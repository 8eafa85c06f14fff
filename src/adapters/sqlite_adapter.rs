//! SQLite storage adapter for accounts, the trade ledger and watchlists.

use chrono::NaiveDateTime;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{ErrorCode, OptionalExtension, ffi, params};
use rust_decimal::Decimal;

use crate::domain::account::Account;
use crate::domain::error::FinanceError;
use crate::domain::ledger::{LedgerEntry, TIMESTAMP_FORMAT};
use crate::domain::money::parse_decimal;
use crate::domain::portfolio::{Holding, apply_trade};
use crate::domain::trade::{TradeKind, TradePlan};
use crate::ports::account_port::AccountPort;
use crate::ports::config_port::ConfigPort;
use crate::ports::ledger_port::LedgerPort;
use crate::ports::watchlist_port::WatchlistPort;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        hash TEXT NOT NULL,
        cash TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS portifolios (
        user_id INTEGER NOT NULL REFERENCES users(id),
        symbol TEXT NOT NULL,
        shares INTEGER NOT NULL CHECK (shares >= 0),
        PRIMARY KEY (user_id, symbol)
    );
    CREATE TABLE IF NOT EXISTS transactions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users(id),
        type TEXT NOT NULL CHECK (type IN ('BUY', 'SELL')),
        name TEXT NOT NULL,
        symbol TEXT NOT NULL,
        price TEXT NOT NULL,
        shares INTEGER NOT NULL,
        date TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_user ON transactions(user_id);
    CREATE TABLE IF NOT EXISTS watchlist (
        user_id INTEGER NOT NULL REFERENCES users(id),
        symbols TEXT NOT NULL,
        PRIMARY KEY (user_id, symbols)
    );";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

/// UNIQUE and PRIMARY KEY failures only; foreign-key, CHECK and NOT NULL
/// violations stay database errors.
fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ErrorCode::ConstraintViolation
                && matches!(
                    e.extended_code,
                    ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                )
    )
}

fn decimal_column(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    parse_decimal(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn account_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        cash: decimal_column(row, 3)?,
    })
}

fn entry_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<LedgerEntry> {
    let kind_str: String = row.get(2)?;
    let kind: TradeKind = kind_str.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let date_str: String = row.get(7)?;
    let executed_at = NaiveDateTime::parse_from_str(&date_str, TIMESTAMP_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(LedgerEntry {
        id: row.get(0)?,
        user_id: row.get(1)?,
        kind,
        name: row.get(3)?,
        symbol: row.get(4)?,
        price: decimal_column(row, 5)?,
        shares: row.get(6)?,
        executed_at,
    })
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, FinanceError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| FinanceError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4).max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path)
            .with_init(|c| c.execute_batch("PRAGMA foreign_keys = ON;"));
        let pool = Pool::builder().max_size(pool_size).build(manager)?;

        tracing::debug!(path = %db_path, pool_size, "opened sqlite pool");
        Ok(Self { pool })
    }

    /// Single-connection in-memory database. The connection is never recycled
    /// so the data lives as long as the adapter.
    pub fn in_memory() -> Result<Self, FinanceError> {
        let manager = SqliteConnectionManager::memory()
            .with_init(|c| c.execute_batch("PRAGMA foreign_keys = ON;"));
        let pool = Pool::builder()
            .max_size(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .build(manager)?;

        Ok(Self { pool })
    }

    pub fn initialize_schema(&self) -> Result<(), FinanceError> {
        let conn = self.conn()?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, FinanceError> {
        Ok(self.pool.get()?)
    }
}

impl AccountPort for SqliteAdapter {
    fn create_account(
        &self,
        username: &str,
        password_hash: &str,
        starting_cash: Decimal,
    ) -> Result<i64, FinanceError> {
        let conn = self.conn()?;
        match conn.execute(
            "INSERT INTO users (username, hash, cash) VALUES (?1, ?2, ?3)",
            params![username, password_hash, starting_cash.to_string()],
        ) {
            Ok(_) => Ok(conn.last_insert_rowid()),
            Err(e) if is_unique_violation(&e) => Err(FinanceError::UsernameTaken),
            Err(e) => Err(e.into()),
        }
    }

    fn find_by_username(&self, username: &str) -> Result<Option<Account>, FinanceError> {
        let conn = self.conn()?;
        let account = conn
            .query_row(
                "SELECT id, username, hash, cash FROM users WHERE username = ?1",
                params![username],
                account_from_row,
            )
            .optional()?;
        Ok(account)
    }

    fn find_by_id(&self, user_id: i64) -> Result<Option<Account>, FinanceError> {
        let conn = self.conn()?;
        let account = conn
            .query_row(
                "SELECT id, username, hash, cash FROM users WHERE id = ?1",
                params![user_id],
                account_from_row,
            )
            .optional()?;
        Ok(account)
    }

    fn list_accounts(&self) -> Result<Vec<Account>, FinanceError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id, username, hash, cash FROM users ORDER BY id")?;
        let rows = stmt.query_map([], account_from_row)?;
        let mut accounts = Vec::new();
        for row in rows {
            accounts.push(row?);
        }
        Ok(accounts)
    }
}

impl LedgerPort for SqliteAdapter {
    fn holdings(&self, user_id: i64) -> Result<Vec<Holding>, FinanceError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT symbol, shares FROM portifolios WHERE user_id = ?1 ORDER BY symbol",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok(Holding {
                symbol: row.get(0)?,
                shares: row.get(1)?,
            })
        })?;
        let mut holdings = Vec::new();
        for row in rows {
            holdings.push(row?);
        }
        Ok(holdings)
    }

    fn shares_held(&self, user_id: i64, symbol: &str) -> Result<i64, FinanceError> {
        let conn = self.conn()?;
        let shares: Option<i64> = conn
            .query_row(
                "SELECT shares FROM portifolios WHERE user_id = ?1 AND symbol = ?2",
                params![user_id, symbol],
                |row| row.get(0),
            )
            .optional()?;
        Ok(shares.unwrap_or(0))
    }

    fn traded_symbols(&self, user_id: i64) -> Result<Vec<String>, FinanceError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT symbol FROM transactions WHERE user_id = ?1 ORDER BY symbol",
        )?;
        let rows = stmt.query_map(params![user_id], |row| row.get(0))?;
        let mut symbols = Vec::new();
        for row in rows {
            symbols.push(row?);
        }
        Ok(symbols)
    }

    fn entries(&self, user_id: i64) -> Result<Vec<LedgerEntry>, FinanceError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, type, name, symbol, price, shares, date
             FROM transactions WHERE user_id = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![user_id], entry_from_row)?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    fn commit_trade(
        &self,
        user_id: i64,
        plan: &TradePlan,
        executed_at: NaiveDateTime,
    ) -> Result<LedgerEntry, FinanceError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO transactions (user_id, type, name, symbol, price, shares, date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                user_id,
                plan.kind.as_str(),
                plan.name,
                plan.symbol,
                plan.price.to_string(),
                plan.shares,
                executed_at.format(TIMESTAMP_FORMAT).to_string(),
            ],
        )?;
        let entry_id = tx.last_insert_rowid();

        let existing: Option<i64> = tx
            .query_row(
                "SELECT shares FROM portifolios WHERE user_id = ?1 AND symbol = ?2",
                params![user_id, plan.symbol],
                |row| row.get(0),
            )
            .optional()?;
        let shares = apply_trade(existing, plan.kind, plan.shares);

        if shares == 0 {
            tx.execute(
                "DELETE FROM portifolios WHERE user_id = ?1 AND symbol = ?2",
                params![user_id, plan.symbol],
            )?;
        } else {
            tx.execute(
                "REPLACE INTO portifolios (user_id, symbol, shares) VALUES (?1, ?2, ?3)",
                params![user_id, plan.symbol, shares],
            )?;
        }

        let updated = tx.execute(
            "UPDATE users SET cash = ?1 WHERE id = ?2",
            params![plan.new_cash.to_string(), user_id],
        )?;
        if updated != 1 {
            return Err(FinanceError::DatabaseQuery {
                reason: format!("no user with id {user_id}"),
            });
        }

        tx.commit()?;

        Ok(LedgerEntry {
            id: entry_id,
            user_id,
            kind: plan.kind,
            name: plan.name.clone(),
            symbol: plan.symbol.clone(),
            price: plan.price,
            shares: plan.shares,
            executed_at,
        })
    }
}

impl WatchlistPort for SqliteAdapter {
    fn watched_symbols(&self, user_id: i64) -> Result<Vec<String>, FinanceError> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT symbols FROM watchlist WHERE user_id = ?1 ORDER BY rowid")?;
        let rows = stmt.query_map(params![user_id], |row| row.get(0))?;
        let mut symbols = Vec::new();
        for row in rows {
            symbols.push(row?);
        }
        Ok(symbols)
    }

    fn watch(&self, user_id: i64, symbol: &str) -> Result<(), FinanceError> {
        let conn = self.conn()?;
        match conn.execute(
            "INSERT INTO watchlist (user_id, symbols) VALUES (?1, ?2)",
            params![user_id, symbol],
        ) {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(FinanceError::AlreadyWatching {
                symbol: symbol.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    fn unwatch(&self, user_id: i64, symbol: &str) -> Result<bool, FinanceError> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM watchlist WHERE user_id = ?1 AND symbols = ?2",
            params![user_id, symbol],
        )?;
        Ok(removed > 0)
    }
}
