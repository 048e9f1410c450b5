//! Emporium Storefront - client-side cart consistency engine.
//!
//! Talks to the storefront REST backend and keeps a local cart that is
//! optimistic for the shopper but defers to the server at well-defined
//! checkpoints.
//!
//! # Modules
//!
//! - [`api`] - REST client and the traits the rest of the crate talks through
//! - [`store`] - the session's cart behind the pure reducer
//! - [`sync`] - server sync checkpoints and optimistic mutations
//! - [`checkout`] - order placement
//! - [`config`] - environment configuration
//! - [`error`] - aggregate error and Sentry helpers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod checkout;
pub mod config;
pub mod error;
pub mod store;
pub mod sync;

pub use api::{ApiClient, ApiError, CartApi, CatalogApi, OrderApi, SessionApi};
pub use checkout::{CheckoutCoordinator, CheckoutError, CheckoutPhase, CheckoutSummary};
pub use config::{ApiConfig, ConfigError, StorefrontConfig};
pub use error::StorefrontError;
pub use store::{CartStore, CartSubscription, Dispatched};
pub use sync::{CartError, MutationOutcome, SessionStatus, SyncAdapter, SyncError};
