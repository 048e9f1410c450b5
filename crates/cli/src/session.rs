//! One storefront session: client, sync adapter and local cart.
//!
//! The session cookie lives in the client's in-memory jar and dies with the
//! process, so there is never a session to restore. Without configured
//! credentials the session stays anonymous and makes no server calls.

use emporium_storefront::api::User;
use emporium_storefront::{ApiClient, CartStore, StorefrontConfig, SyncAdapter};

use crate::commands::CommandError;

pub struct Session {
    pub client: ApiClient,
    pub sync: SyncAdapter<ApiClient>,
    pub store: CartStore,
    pub user: Option<User>,
}

impl Session {
    /// Open a session, logging in when credentials are configured. A login
    /// adopts the server cart as the local cart.
    pub async fn open(config: &StorefrontConfig, admin: bool) -> Result<Self, CommandError> {
        let client = ApiClient::new(&config.api)?;
        let sync = SyncAdapter::new(client.clone());
        let mut store = CartStore::new();

        let user = match config.account.credentials() {
            Some(credentials) if admin => Some(sync.admin_login(&mut store, &credentials).await?),
            Some(credentials) => Some(sync.login(&mut store, &credentials).await?),
            None if admin => return Err(CommandError::MissingCredentials),
            None => None,
        };

        Ok(Self {
            client,
            sync,
            store,
            user,
        })
    }

    /// The logged-in user, for commands that need one.
    pub fn require_user(&self) -> Result<&User, CommandError> {
        self.user.as_ref().ok_or(CommandError::NotLoggedIn)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use emporium_storefront::ApiConfig;
    use emporium_storefront::config::AccountConfig;

    use super::*;

    fn config_without_account() -> StorefrontConfig {
        StorefrontConfig {
            // Nothing listens here; an anonymous session must not call out
            api: ApiConfig::new("http://127.0.0.1:9/").unwrap(),
            account: AccountConfig::default(),
            sentry_dsn: None,
            sentry_environment: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn test_no_credentials_opens_anonymous_session_offline() {
        let session = Session::open(&config_without_account(), false).await.unwrap();

        assert!(session.user.is_none());
        assert!(session.store.is_empty());
        assert!(matches!(
            session.require_user(),
            Err(CommandError::NotLoggedIn)
        ));
    }

    #[tokio::test]
    async fn test_admin_without_credentials_is_refused() {
        let result = Session::open(&config_without_account(), true).await;

        assert!(matches!(result, Err(CommandError::MissingCredentials)));
    }
}
