//! Domain error types.

/// Top-level error type for papertrade.
///
/// Validation variants carry the message shown to the user on the apology
/// page, so their `Display` output is user-facing text.
#[derive(Debug, thiserror::Error)]
pub enum FinanceError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("{0}")]
    Validation(String),

    #[error("invalid username and/or password")]
    InvalidCredentials,

    #[error("Username already exists.")]
    UsernameTaken,

    #[error("Symbol already exists!")]
    AlreadyWatching { symbol: String },

    #[error("Symbol doesn't exist: {symbol}")]
    UnknownSymbol { symbol: String },

    #[error("Not enough cash")]
    InsufficientCash,

    #[error("Not enough shares")]
    InsufficientShares { held: i64, requested: i64 },

    #[error("you don't have shares of this stock")]
    NoHoldings { symbol: String },

    #[error("quote service error: {reason}")]
    QuoteService { reason: String },

    #[error("password hashing error: {reason}")]
    PasswordHash { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FinanceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// True for errors caused by user input rather than by the system.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::InvalidCredentials
                | Self::UsernameTaken
                | Self::AlreadyWatching { .. }
                | Self::UnknownSymbol { .. }
                | Self::InsufficientCash
                | Self::InsufficientShares { .. }
                | Self::NoHoldings { .. }
        )
    }
}

impl From<rusqlite::Error> for FinanceError {
    fn from(err: rusqlite::Error) -> Self {
        Self::DatabaseQuery {
            reason: err.to_string(),
        }
    }
}

impl From<r2d2::Error> for FinanceError {
    fn from(err: r2d2::Error) -> Self {
        Self::Database {
            reason: err.to_string(),
        }
    }
}

impl From<&FinanceError> for std::process::ExitCode {
    fn from(err: &FinanceError) -> Self {
        let code: u8 = match err {
            FinanceError::Io(_) => 1,
            FinanceError::ConfigParse { .. }
            | FinanceError::ConfigMissing { .. }
            | FinanceError::ConfigInvalid { .. } => 2,
            FinanceError::Database { .. } | FinanceError::DatabaseQuery { .. } => 3,
            FinanceError::QuoteService { .. } => 4,
            _ => 5,
        };
        std::process::ExitCode::from(code)
    }
}
