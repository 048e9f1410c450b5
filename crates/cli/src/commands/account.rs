//! `emporium register`

use emporium_storefront::api::Registration;
use emporium_storefront::{ApiClient, SessionApi, StorefrontConfig};

use super::CommandError;
use crate::output;

/// Create the configured account. The backend opens no session, so the
/// next invocation logs in with the same credentials.
pub async fn register(config: &StorefrontConfig, name: &str) -> Result<(), CommandError> {
    let (Some(email), Some(password)) = (&config.account.email, &config.account.password) else {
        return Err(CommandError::MissingCredentials);
    };
    let registration = Registration::new(name, email.clone(), password.clone());

    let client = ApiClient::new(&config.api)?;
    let message = client.register(&registration).await?;
    output::notice(&message);
    Ok(())
}
