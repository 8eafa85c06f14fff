//! User account storage port.

use rust_decimal::Decimal;

use crate::domain::account::Account;
use crate::domain::error::FinanceError;

pub trait AccountPort {
    /// Creates a user with the given starting cash and returns its id.
    ///
    /// Fails with [`FinanceError::UsernameTaken`] if the username exists.
    fn create_account(
        &self,
        username: &str,
        password_hash: &str,
        starting_cash: Decimal,
    ) -> Result<i64, FinanceError>;

    fn find_by_username(&self, username: &str) -> Result<Option<Account>, FinanceError>;

    fn find_by_id(&self, user_id: i64) -> Result<Option<Account>, FinanceError>;

    fn list_accounts(&self) -> Result<Vec<Account>, FinanceError>;
}
