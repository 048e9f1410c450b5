//! Session boundary: who is logged in.
//!
//! Authentication itself is the backend's business. This client only
//! carries the opaque session cookie and reacts to "authenticated" versus
//! "not authenticated".

use std::future::Future;

use tracing::instrument;

use super::types::{
    Credentials, LoginRequest, MessageBody, RegisterRequest, Registration, User, UserEnvelope,
};
use super::{ApiClient, ApiError, ApiResult};

const REGISTER: &str = "api/auth/register";
const ME: &str = "api/auth/me";
const LOGIN: &str = "api/auth/login";
const ADMIN_LOGIN: &str = "api/auth/admin/login";
const LOGOUT: &str = "api/auth/logout";

const REGISTERED: &str = "Registered successfully";

/// Session endpoints.
pub trait SessionApi: Send + Sync {
    /// Create a shopper account and return the server's confirmation.
    ///
    /// Does not log in; the backend opens no session on registration.
    fn register(
        &self,
        registration: &Registration,
    ) -> impl Future<Output = ApiResult<String>> + Send;

    /// The current user, or `Ok(None)` when the session is not authenticated.
    fn current_user(&self) -> impl Future<Output = ApiResult<Option<User>>> + Send;

    /// Log in as a shopper.
    fn login(&self, credentials: &Credentials) -> impl Future<Output = ApiResult<User>> + Send;

    /// Log in through the admin gate.
    fn admin_login(&self, credentials: &Credentials)
    -> impl Future<Output = ApiResult<User>> + Send;

    /// End the session.
    fn logout(&self) -> impl Future<Output = ApiResult<()>> + Send;
}

impl ApiClient {
    async fn login_at(&self, path: &str, credentials: &Credentials) -> ApiResult<User> {
        let envelope: UserEnvelope = self.post(path, &LoginRequest::from(credentials)).await?;
        envelope
            .user
            .ok_or_else(|| ApiError::Parse("login response carried no user".to_string()))
    }
}

impl SessionApi for ApiClient {
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    async fn register(&self, registration: &Registration) -> ApiResult<String> {
        let body: MessageBody = self
            .post(REGISTER, &RegisterRequest::from(registration))
            .await?;
        Ok(body.message.unwrap_or_else(|| REGISTERED.to_string()))
    }

    #[instrument(skip(self))]
    async fn current_user(&self) -> ApiResult<Option<User>> {
        match self.get::<UserEnvelope>(ME).await {
            Ok(envelope) => Ok(envelope.user),
            Err(ApiError::Unauthorized(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    async fn login(&self, credentials: &Credentials) -> ApiResult<User> {
        self.login_at(LOGIN, credentials).await
    }

    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    async fn admin_login(&self, credentials: &Credentials) -> ApiResult<User> {
        self.login_at(ADMIN_LOGIN, credentials).await
    }

    #[instrument(skip(self))]
    async fn logout(&self) -> ApiResult<()> {
        self.post_empty_ack(LOGOUT).await
    }
}
