//! Subcommand implementations.

pub mod account;
pub mod cart;
pub mod checkout;
pub mod orders;
pub mod products;

use thiserror::Error;

use emporium_core::{LineKey, OrderId, OrderStatus, SelectionError};
use emporium_storefront::{
    ApiError, CartError, CheckoutError, ConfigError, StorefrontError, SyncError,
};

/// Errors a subcommand can end with.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Storefront(#[from] StorefrontError),

    #[error("Set EMPORIUM_EMAIL and EMPORIUM_PASSWORD to log in")]
    MissingCredentials,

    #[error("You need to be logged in for this; set EMPORIUM_EMAIL and EMPORIUM_PASSWORD")]
    NotLoggedIn,

    #[error("{0} is not in the cart")]
    NotInCart(LineKey),

    #[error("Order {id} is {status} and can no longer be cancelled")]
    NotCancellable { id: OrderId, status: OrderStatus },
}

impl CommandError {
    /// Log the error, capturing unexpected ones to Sentry.
    pub fn report(&self) {
        match self {
            Self::Storefront(err) => err.report(),
            _ => tracing::info!(error = %self, "Command refused"),
        }
    }
}

macro_rules! via_storefront_error {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for CommandError {
                fn from(err: $ty) -> Self {
                    Self::Storefront(StorefrontError::from(err))
                }
            }
        )*
    };
}

via_storefront_error!(ApiError, CartError, CheckoutError, ConfigError, SelectionError, SyncError);
