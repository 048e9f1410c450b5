//! Unified error handling with Sentry integration.
//!
//! Each module keeps its own error enum; [`StorefrontError`] gathers them for
//! callers (such as the CLI) that drive several modules in one flow.

use thiserror::Error;

use emporium_core::SelectionError;

use crate::api::ApiError;
use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::sync::{CartError, SyncError};

/// Any error the storefront client can produce.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// Backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Local cart rule refused the mutation.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Cart sync with the backend failed.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Order placement failed.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Product selection was incomplete.
    #[error(transparent)]
    Selection(#[from] SelectionError),
}

impl StorefrontError {
    /// Whether this error points at a bug or an outage rather than at
    /// something the shopper can fix.
    #[must_use]
    pub fn is_unexpected(&self) -> bool {
        match self {
            Self::Api(err) => matches!(err, ApiError::Parse(_) | ApiError::InvalidUrl(_)),
            Self::Sync(_) | Self::Config(_) => true,
            Self::Checkout(err) => matches!(
                err,
                CheckoutError::Unavailable(_) | CheckoutError::Unconfirmed(_)
            ),
            Self::Cart(_) | Self::Selection(_) => false,
        }
    }

    /// Log the error, capturing unexpected ones to Sentry.
    pub fn report(&self) {
        if self.is_unexpected() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Storefront error"
            );
        } else {
            tracing::info!(error = %self, "Storefront request refused");
        }
    }
}

/// Result type alias for `StorefrontError`.
pub type Result<T> = std::result::Result<T, StorefrontError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of cart
/// actions leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use emporium_core::LineKey;

    use super::*;

    #[test]
    fn test_storefront_error_display_is_transparent() {
        let err = StorefrontError::from(CartError::StockExceeded { max_stock: 2 });
        assert_eq!(err.to_string(), "only 2 available");

        let err = StorefrontError::from(CheckoutError::Rejected(
            "Insufficient stock for Runner".to_string(),
        ));
        assert_eq!(err.to_string(), "Insufficient stock for Runner");
    }

    #[test]
    fn test_unexpected_classification() {
        assert!(!StorefrontError::from(CartError::OutOfStock {
            key: LineKey::new("A", Some("9")),
        })
        .is_unexpected());
        assert!(!StorefrontError::from(CheckoutError::EmptyCart).is_unexpected());
        assert!(StorefrontError::from(ApiError::Parse("bad".to_string())).is_unexpected());
        assert!(
            StorefrontError::from(CheckoutError::Unconfirmed(ApiError::Parse("bad".to_string())))
                .is_unexpected()
        );
        assert!(
            !StorefrontError::from(ApiError::Unauthorized("login".to_string())).is_unexpected()
        );
    }

    #[test]
    fn test_sentry_helpers_without_client() {
        set_sentry_user(&"u1", Some("a@b.com"));
        add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "A")]));
        clear_sentry_user();
    }
}
