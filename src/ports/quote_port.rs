//! Quote lookup port.

use async_trait::async_trait;

use crate::domain::error::FinanceError;
use crate::domain::quote::Quote;

#[async_trait]
pub trait QuotePort: Send + Sync {
    /// `Ok(None)` means the service does not know the symbol.
    async fn lookup(&self, symbol: &str) -> Result<Option<Quote>, FinanceError>;
}
