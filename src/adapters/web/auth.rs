//! Authentication backend for axum-login, backed by the account store.

use axum_login::{AuthUser, AuthnBackend, UserId};
use std::sync::Arc;

use crate::domain::account::{Account, verify_password};
use crate::domain::error::FinanceError;
use crate::ports::account_port::AccountPort;

pub type AuthSession = axum_login::AuthSession<Backend>;

/// The logged-in user kept in the session.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub id: i64,
    pub username: String,
    /// Password hash bytes; a password change invalidates existing sessions.
    pw_hash_bytes: Vec<u8>,
}

impl From<Account> for SessionUser {
    fn from(account: Account) -> Self {
        SessionUser {
            id: account.id,
            username: account.username,
            pw_hash_bytes: account.password_hash.into_bytes(),
        }
    }
}

impl AuthUser for SessionUser {
    type Id = i64;

    fn id(&self) -> i64 {
        self.id
    }

    fn session_auth_hash(&self) -> &[u8] {
        &self.pw_hash_bytes
    }
}

/// Login credentials submitted via the login form.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Clone)]
pub struct Backend {
    accounts: Arc<dyn AccountPort + Send + Sync>,
}

impl Backend {
    pub fn new(accounts: Arc<dyn AccountPort + Send + Sync>) -> Self {
        Self { accounts }
    }
}

impl AuthnBackend for Backend {
    type User = SessionUser;
    type Credentials = Credentials;
    type Error = FinanceError;

    async fn authenticate(
        &self,
        creds: Self::Credentials,
    ) -> Result<Option<Self::User>, Self::Error> {
        let Some(account) = self.accounts.find_by_username(&creds.username)? else {
            return Ok(None);
        };

        let stored_hash = account.password_hash.clone();
        let verified =
            tokio::task::spawn_blocking(move || verify_password(&creds.password, &stored_hash))
                .await
                .map_err(|e| FinanceError::PasswordHash {
                    reason: e.to_string(),
                })?;

        Ok(verified.then(|| account.into()))
    }

    async fn get_user(&self, user_id: &UserId<Self>) -> Result<Option<Self::User>, Self::Error> {
        Ok(self.accounts.find_by_id(*user_id)?.map(Into::into))
    }
}
