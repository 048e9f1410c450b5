//! Keeps the local cart consistent with the server cart.
//!
//! # Checkpoints
//!
//! - bootstrap, login and admin login replace the local cart with the
//!   server's (never merge); an absent or unreachable server cart counts as
//!   empty
//! - logout empties the local cart
//! - [`SyncAdapter::reconcile`] is the explicit full replacement a caller
//!   asks for after a mutation did not persist
//!
//! # Mutations
//!
//! Local dispatch is optimistic: it is applied first and the equivalent
//! remote call follows. A failed remote call is not rolled back; it comes
//! back as [`MutationOutcome::NotPersisted`] and marks the store as drifted
//! until the next full replacement.

use thiserror::Error;
use tracing::instrument;

use emporium_core::{CartAction, CartSignal, LineItem, LineKey, ProductSnapshot, SelectionError};

use crate::api::{ApiError, CartApi, Credentials, ServerCart, SessionApi, User};
use crate::error::{add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::store::CartStore;

/// Local refusal of a cart mutation. Nothing was sent to the server.
#[derive(Debug, Error)]
pub enum CartError {
    /// The quantity would exceed the line's stock ceiling.
    #[error("only {max_stock} available")]
    StockExceeded { max_stock: u32 },

    /// The selected product or size has no stock.
    #[error("{key} is out of stock")]
    OutOfStock { key: LineKey },

    /// The product selection is incomplete.
    #[error(transparent)]
    Selection(#[from] SelectionError),
}

impl From<CartSignal> for CartError {
    fn from(signal: CartSignal) -> Self {
        match signal {
            CartSignal::StockExceeded { max_stock } => Self::StockExceeded { max_stock },
        }
    }
}

/// Failure of an explicit sync with the server.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The server cart could not be fetched; local state was kept.
    #[error("Cart sync unavailable: {0}")]
    Unavailable(#[source] ApiError),
}

/// What happened to the remote counterpart of a local mutation.
#[derive(Debug)]
pub enum MutationOutcome {
    /// Applied locally and acknowledged by the server.
    Persisted,
    /// Nothing changed locally, so nothing was sent.
    Unchanged,
    /// Applied locally but the server call failed. Local and server carts
    /// may now differ.
    NotPersisted(ApiError),
}

impl MutationOutcome {
    #[must_use]
    pub const fn is_persisted(&self) -> bool {
        matches!(self, Self::Persisted)
    }
}

/// Session state reported after bootstrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    Authenticated(User),
    Anonymous,
}

/// Bridges a [`CartStore`] and the backend.
#[derive(Debug, Clone)]
pub struct SyncAdapter<B> {
    backend: B,
}

impl<B: CartApi + SessionApi> SyncAdapter<B> {
    pub const fn new(backend: B) -> Self {
        Self { backend }
    }

    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    // =========================================================================
    // Checkpoints
    // =========================================================================

    /// Restore the session on process start.
    ///
    /// Never fails: an unauthenticated or unreachable backend leaves an
    /// empty local cart.
    #[instrument(skip_all)]
    pub async fn bootstrap(&self, store: &mut CartStore) -> SessionStatus {
        match self.backend.current_user().await {
            Ok(Some(user)) => {
                set_sentry_user(&user.id, Some(&user.email));
                self.replace_or_empty(store).await;
                tracing::info!(
                    user_id = %user.id,
                    lines = store.items().len(),
                    "Session restored"
                );
                SessionStatus::Authenticated(user)
            }
            Ok(None) => {
                store.dispatch(CartAction::SetCart(Vec::new()));
                SessionStatus::Anonymous
            }
            Err(e) => {
                tracing::warn!(error = %e, "Session check failed, starting with an empty cart");
                store.dispatch(CartAction::SetCart(Vec::new()));
                SessionStatus::Anonymous
            }
        }
    }

    /// Log in as a shopper, then adopt the server cart.
    ///
    /// # Errors
    ///
    /// Returns the login error; the local cart is untouched in that case.
    #[instrument(skip_all, fields(email = %credentials.email))]
    pub async fn login(
        &self,
        store: &mut CartStore,
        credentials: &Credentials,
    ) -> Result<User, ApiError> {
        let user = self.backend.login(credentials).await?;
        self.after_login(store, &user).await;
        Ok(user)
    }

    /// Log in through the admin gate, then adopt the server cart.
    ///
    /// # Errors
    ///
    /// Returns the login error; the local cart is untouched in that case.
    #[instrument(skip_all, fields(email = %credentials.email))]
    pub async fn admin_login(
        &self,
        store: &mut CartStore,
        credentials: &Credentials,
    ) -> Result<User, ApiError> {
        let user = self.backend.admin_login(credentials).await?;
        self.after_login(store, &user).await;
        Ok(user)
    }

    async fn after_login(&self, store: &mut CartStore, user: &User) {
        set_sentry_user(&user.id, Some(&user.email));
        add_breadcrumb("auth", "Logged in", Some(&[("user_id", user.id.as_str())]));
        self.replace_or_empty(store).await;
        tracing::info!(
            user_id = %user.id,
            role = %user.role,
            lines = store.items().len(),
            "Logged in"
        );
    }

    /// End the session.
    ///
    /// The server cart is cleared first while the session is still valid;
    /// that call is best effort. The local cart is emptied whatever the
    /// backend answers.
    ///
    /// # Errors
    ///
    /// Returns the logout endpoint's error. The local cart is already empty.
    #[instrument(skip_all)]
    pub async fn logout(&self, store: &mut CartStore) -> Result<(), ApiError> {
        if let Err(e) = self.backend.clear_cart().await {
            tracing::warn!(error = %e, "Remote cart clear on logout failed");
        }

        let result = self.backend.logout().await;
        if let Err(e) = &result {
            tracing::warn!(error = %e, "Logout call failed");
        }

        store.dispatch(CartAction::SetCart(Vec::new()));
        clear_sentry_user();
        add_breadcrumb("auth", "Logged out", None);
        result
    }

    /// Replace the local cart with the server's.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Unavailable` if the server cart could not be
    /// fetched; the local cart and its drift marker are left as they were.
    #[instrument(skip_all)]
    pub async fn reconcile(&self, store: &mut CartStore) -> Result<(), SyncError> {
        let items = self.fetch_items().await.map_err(SyncError::Unavailable)?;
        store.dispatch(CartAction::SetCart(items));
        Ok(())
    }

    async fn fetch_items(&self) -> Result<Vec<LineItem>, ApiError> {
        Ok(self
            .backend
            .fetch_cart()
            .await?
            .map(ServerCart::into_line_items)
            .unwrap_or_default())
    }

    async fn replace_or_empty(&self, store: &mut CartStore) {
        let items = match self.fetch_items().await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(error = %e, "Cart sync unavailable, starting with an empty cart");
                Vec::new()
            }
        };
        store.dispatch(CartAction::SetCart(items));
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add one unit of the selected product and size.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the selection is incomplete, out of stock, or
    /// at its stock ceiling.
    pub async fn add_product(
        &self,
        store: &mut CartStore,
        product: &ProductSnapshot,
        size: Option<&str>,
    ) -> Result<MutationOutcome, CartError> {
        let item = LineItem::from_selection(product, size)?;
        self.add(store, item).await
    }

    /// Add one unit of `item`, whose `max_stock` is taken as the current
    /// ceiling.
    ///
    /// # Errors
    ///
    /// Returns `CartError::OutOfStock` when `max_stock` is zero and
    /// `CartError::StockExceeded` when the line is already at its ceiling.
    #[instrument(skip_all, fields(product_id = %item.product_id, size = ?item.size))]
    pub async fn add(
        &self,
        store: &mut CartStore,
        item: LineItem,
    ) -> Result<MutationOutcome, CartError> {
        let key = item.key();
        if item.max_stock == 0 {
            return Err(CartError::OutOfStock { key });
        }

        let dispatched = store.dispatch(CartAction::Add(item));
        if let Some(signal) = dispatched.signal {
            return Err(signal.into());
        }
        if !dispatched.changed {
            return Ok(MutationOutcome::Unchanged);
        }

        add_breadcrumb("cart", "Added to cart", Some(&breadcrumb_data(&key)));
        let result = self.backend.add_line(&key, 1).await;
        Ok(settle(store, "add", result))
    }

    /// Set a line's quantity; zero or less removes it.
    ///
    /// # Errors
    ///
    /// Returns `CartError::StockExceeded` if `qty` is above the line's
    /// ceiling.
    #[instrument(skip(self, store))]
    pub async fn update_qty(
        &self,
        store: &mut CartStore,
        key: &LineKey,
        qty: i64,
    ) -> Result<MutationOutcome, CartError> {
        let dispatched = store.dispatch(CartAction::UpdateQty {
            key: key.clone(),
            qty,
        });
        if let Some(signal) = dispatched.signal {
            return Err(signal.into());
        }
        if !dispatched.changed {
            return Ok(MutationOutcome::Unchanged);
        }

        let result = match u32::try_from(qty) {
            Ok(qty) if qty > 0 => self.backend.update_line(key, qty).await,
            _ => self.backend.remove_line(key).await,
        };
        Ok(settle(store, "update_qty", result))
    }

    /// Delete a line. Removing an absent line sends nothing.
    #[instrument(skip(self, store))]
    pub async fn remove(&self, store: &mut CartStore, key: &LineKey) -> MutationOutcome {
        if !store.dispatch(CartAction::Remove(key.clone())).changed {
            return MutationOutcome::Unchanged;
        }

        add_breadcrumb("cart", "Removed from cart", Some(&breadcrumb_data(key)));
        let result = self.backend.remove_line(key).await;
        settle(store, "remove", result)
    }

    /// Empty the cart. Clearing an empty cart sends nothing.
    #[instrument(skip_all)]
    pub async fn clear(&self, store: &mut CartStore) -> MutationOutcome {
        if !store.dispatch(CartAction::Clear).changed {
            return MutationOutcome::Unchanged;
        }

        let result = self.backend.clear_cart().await;
        settle(store, "clear", result)
    }
}

fn breadcrumb_data(key: &LineKey) -> [(&str, &str); 2] {
    [
        ("product_id", key.product_id.as_str()),
        ("size", key.size.as_deref().unwrap_or("")),
    ]
}

fn settle(store: &mut CartStore, action: &str, result: Result<(), ApiError>) -> MutationOutcome {
    match result {
        Ok(()) => MutationOutcome::Persisted,
        Err(e) => {
            tracing::warn!(
                action,
                error = %e,
                "Cart change not persisted, local cart may have drifted"
            );
            store.mark_drifted();
            MutationOutcome::NotPersisted(e)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use emporium_core::{Money, ProductId, SizeStock, UserId, UserRole};

    use super::*;
    use crate::api::{ApiResult, Registration, ServerCartEntry};

    #[derive(Default)]
    struct FakeState {
        user: Option<User>,
        cart: Option<ServerCart>,
        fail_fetch: bool,
        fail_mutations: bool,
        fail_logout: bool,
        calls: Vec<String>,
    }

    #[derive(Clone, Default)]
    struct FakeBackend {
        state: Arc<Mutex<FakeState>>,
    }

    fn unreachable_error() -> ApiError {
        ApiError::Rejected {
            status: 503,
            message: "Service Unavailable".to_string(),
        }
    }

    impl FakeBackend {
        fn with(f: impl FnOnce(&mut FakeState)) -> Self {
            let backend = Self::default();
            f(&mut backend.state.lock().unwrap());
            backend
        }

        fn calls(&self) -> Vec<String> {
            self.state.lock().unwrap().calls.clone()
        }

        fn record(&self, call: String) -> ApiResult<()> {
            let mut state = self.state.lock().unwrap();
            state.calls.push(call);
            if state.fail_mutations {
                Err(unreachable_error())
            } else {
                Ok(())
            }
        }
    }

    impl CartApi for FakeBackend {
        async fn fetch_cart(&self) -> ApiResult<Option<ServerCart>> {
            let mut state = self.state.lock().unwrap();
            state.calls.push("fetch".to_string());
            if state.fail_fetch {
                return Err(unreachable_error());
            }
            Ok(state.cart.clone())
        }

        async fn add_line(&self, key: &LineKey, quantity: u32) -> ApiResult<()> {
            self.record(format!("add {key} x{quantity}"))
        }

        async fn update_line(&self, key: &LineKey, quantity: u32) -> ApiResult<()> {
            self.record(format!("update {key} x{quantity}"))
        }

        async fn remove_line(&self, key: &LineKey) -> ApiResult<()> {
            self.record(format!("remove {key}"))
        }

        async fn clear_cart(&self) -> ApiResult<()> {
            self.record("clear".to_string())
        }
    }

    impl SessionApi for FakeBackend {
        async fn register(&self, _registration: &Registration) -> ApiResult<String> {
            Ok("Registered successfully".to_string())
        }

        async fn current_user(&self) -> ApiResult<Option<User>> {
            let state = self.state.lock().unwrap();
            if state.fail_fetch {
                return Err(unreachable_error());
            }
            Ok(state.user.clone())
        }

        async fn login(&self, credentials: &Credentials) -> ApiResult<User> {
            let mut state = self.state.lock().unwrap();
            state.calls.push(format!("login {}", credentials.email));
            state
                .user
                .clone()
                .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))
        }

        async fn admin_login(&self, credentials: &Credentials) -> ApiResult<User> {
            let user = self.login(credentials).await?;
            if user.role == UserRole::Admin {
                Ok(user)
            } else {
                Err(ApiError::Unauthorized("Admins only".to_string()))
            }
        }

        async fn logout(&self) -> ApiResult<()> {
            let mut state = self.state.lock().unwrap();
            state.calls.push("logout".to_string());
            if state.fail_logout {
                return Err(unreachable_error());
            }
            state.user = None;
            Ok(())
        }
    }

    fn shopper(role: UserRole) -> User {
        User {
            id: UserId::new("u1"),
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            role,
        }
    }

    fn credentials() -> Credentials {
        Credentials::new("asha@example.com", "correct horse")
    }

    fn product(id: &str, sizes: &[(&str, i64)]) -> ProductSnapshot {
        ProductSnapshot {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            price: Money::from_whole(250),
            image: format!("{id}.jpg"),
            category: None,
            description: None,
            sizes: sizes
                .iter()
                .map(|(size, stock)| SizeStock {
                    size: (*size).to_string(),
                    stock: *stock,
                })
                .collect(),
            stock: 0,
        }
    }

    fn server_cart(entries: &[(&str, &str, i64)]) -> ServerCart {
        ServerCart {
            items: entries
                .iter()
                .map(|(id, size, quantity)| ServerCartEntry {
                    product: Some(product(id, &[(*size, 10)])),
                    size: Some((*size).to_string()),
                    quantity: *quantity,
                })
                .collect(),
        }
    }

    fn line(id: &str, size: &str, max_stock: u32) -> LineItem {
        LineItem::from_selection(&product(id, &[(size, i64::from(max_stock))]), Some(size))
            .unwrap()
    }

    #[tokio::test]
    async fn test_login_replaces_never_merges() {
        let backend = FakeBackend::with(|s| {
            s.user = Some(shopper(UserRole::User));
            s.cart = Some(server_cart(&[("Y", "M", 1)]));
        });
        let sync = SyncAdapter::new(backend);

        let mut store = CartStore::new();
        store.dispatch(CartAction::Add(line("X", "9", 3)));

        sync.login(&mut store, &credentials()).await.unwrap();

        let keys: Vec<_> = store.items().iter().map(LineItem::key).collect();
        assert_eq!(keys, vec![LineKey::new("Y", Some("M"))]);
    }

    #[tokio::test]
    async fn test_login_with_unreachable_cart_starts_empty() {
        let backend = FakeBackend::with(|s| s.user = Some(shopper(UserRole::User)));
        let sync = SyncAdapter::new(backend.clone());
        let mut store = CartStore::new();
        store.dispatch(CartAction::Add(line("X", "9", 3)));

        backend.state.lock().unwrap().fail_fetch = true;
        let user = sync.login(&mut store, &credentials()).await.unwrap();

        assert_eq!(user.id.as_str(), "u1");
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_failed_login_keeps_local_cart() {
        let sync = SyncAdapter::new(FakeBackend::default());
        let mut store = CartStore::new();
        store.dispatch(CartAction::Add(line("X", "9", 3)));

        let err = sync.login(&mut store, &credentials()).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
        assert_eq!(store.items().len(), 1);
    }

    #[tokio::test]
    async fn test_admin_login_requires_admin() {
        let backend = FakeBackend::with(|s| {
            s.user = Some(shopper(UserRole::Admin));
            s.cart = Some(server_cart(&[("A", "9", 2)]));
        });
        let sync = SyncAdapter::new(backend);
        let mut store = CartStore::new();

        let user = sync.admin_login(&mut store, &credentials()).await.unwrap();
        assert_eq!(user.role, UserRole::Admin);
        assert_eq!(store.total_items(), 2);
    }

    #[tokio::test]
    async fn test_bootstrap_authenticated_adopts_server_cart() {
        let backend = FakeBackend::with(|s| {
            s.user = Some(shopper(UserRole::User));
            s.cart = Some(server_cart(&[("A", "9", 2), ("B", "L", 1)]));
        });
        let sync = SyncAdapter::new(backend);
        let mut store = CartStore::new();

        let status = sync.bootstrap(&mut store).await;
        assert_eq!(status, SessionStatus::Authenticated(shopper(UserRole::User)));
        assert_eq!(store.total_items(), 3);
        assert_eq!(store.total_price(), Money::from_whole(750));
    }

    #[tokio::test]
    async fn test_bootstrap_fails_open_to_empty() {
        let sync = SyncAdapter::new(FakeBackend::with(|s| s.fail_fetch = true));
        let mut store = CartStore::new();
        store.dispatch(CartAction::Add(line("X", "9", 3)));

        assert_eq!(sync.bootstrap(&mut store).await, SessionStatus::Anonymous);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_bootstrap_without_server_cart_is_empty() {
        let backend = FakeBackend::with(|s| s.user = Some(shopper(UserRole::User)));
        let sync = SyncAdapter::new(backend);
        let mut store = CartStore::new();

        let status = sync.bootstrap(&mut store).await;
        assert!(matches!(status, SessionStatus::Authenticated(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_add_sends_single_unit() {
        let backend = FakeBackend::default();
        let sync = SyncAdapter::new(backend.clone());
        let mut store = CartStore::new();

        let a9 = product("A", &[("9", 2)]);
        let outcome = sync.add_product(&mut store, &a9, Some("9")).await.unwrap();
        assert!(outcome.is_persisted());
        sync.add_product(&mut store, &a9, Some("9")).await.unwrap();

        let err = sync.add_product(&mut store, &a9, Some("9")).await.unwrap_err();
        assert!(matches!(err, CartError::StockExceeded { max_stock: 2 }));

        assert_eq!(store.total_items(), 2);
        assert_eq!(backend.calls(), vec!["add A (size 9) x1", "add A (size 9) x1"]);
    }

    #[tokio::test]
    async fn test_add_out_of_stock_sends_nothing() {
        let backend = FakeBackend::default();
        let sync = SyncAdapter::new(backend.clone());
        let mut store = CartStore::new();

        let sold_out = product("A", &[("9", 0), ("10", 4)]);
        let err = sync
            .add_product(&mut store, &sold_out, Some("9"))
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::OutOfStock { .. }));

        let err = sync
            .add_product(&mut store, &sold_out, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::Selection(SelectionError::SizeRequired { .. })));

        assert!(store.is_empty());
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_remote_add_keeps_local_line_and_marks_drift() {
        let backend = FakeBackend::with(|s| s.fail_mutations = true);
        let sync = SyncAdapter::new(backend.clone());
        let mut store = CartStore::new();

        let outcome = sync.add(&mut store, line("A", "9", 2)).await.unwrap();
        assert!(matches!(outcome, MutationOutcome::NotPersisted(_)));
        assert_eq!(store.total_items(), 1);
        assert!(store.is_drifted());

        sync.reconcile(&mut store).await.unwrap();
        assert!(store.is_empty());
        assert!(!store.is_drifted());
    }

    #[tokio::test]
    async fn test_reconcile_unavailable_keeps_local_state() {
        let backend = FakeBackend::with(|s| s.fail_mutations = true);
        let sync = SyncAdapter::new(backend.clone());
        let mut store = CartStore::new();
        sync.add(&mut store, line("A", "9", 2)).await.unwrap();

        backend.state.lock().unwrap().fail_fetch = true;
        let err = sync.reconcile(&mut store).await.unwrap_err();
        assert!(matches!(err, SyncError::Unavailable(_)));
        assert_eq!(store.total_items(), 1);
        assert!(store.is_drifted());
    }

    #[tokio::test]
    async fn test_update_qty_maps_to_remote_calls() {
        let backend = FakeBackend::default();
        let sync = SyncAdapter::new(backend.clone());
        let mut store = CartStore::new();
        let key = LineKey::new("A", Some("9"));
        sync.add(&mut store, line("A", "9", 5)).await.unwrap();

        sync.update_qty(&mut store, &key, 4).await.unwrap();
        assert_eq!(store.find(&key).unwrap().qty, 4);

        let err = sync.update_qty(&mut store, &key, 6).await.unwrap_err();
        assert!(matches!(err, CartError::StockExceeded { max_stock: 5 }));

        let outcome = sync.update_qty(&mut store, &key, 4).await.unwrap();
        assert!(matches!(outcome, MutationOutcome::Unchanged));

        sync.update_qty(&mut store, &key, 0).await.unwrap();
        assert!(store.find(&key).is_none());

        assert_eq!(
            backend.calls(),
            vec!["add A (size 9) x1", "update A (size 9) x4", "remove A (size 9)"]
        );
    }

    #[tokio::test]
    async fn test_remove_and_clear_skip_no_ops() {
        let backend = FakeBackend::default();
        let sync = SyncAdapter::new(backend.clone());
        let mut store = CartStore::new();

        let outcome = sync.remove(&mut store, &LineKey::new("A", Some("9"))).await;
        assert!(matches!(outcome, MutationOutcome::Unchanged));
        assert!(matches!(sync.clear(&mut store).await, MutationOutcome::Unchanged));

        sync.add(&mut store, line("A", "9", 5)).await.unwrap();
        assert!(sync.clear(&mut store).await.is_persisted());
        assert!(store.is_empty());
        assert_eq!(backend.calls(), vec!["add A (size 9) x1", "clear"]);
    }

    #[tokio::test]
    async fn test_logout_clears_remote_then_local() {
        let backend = FakeBackend::with(|s| {
            s.user = Some(shopper(UserRole::User));
            s.cart = Some(server_cart(&[("A", "9", 1)]));
        });
        let sync = SyncAdapter::new(backend.clone());
        let mut store = CartStore::new();
        sync.login(&mut store, &credentials()).await.unwrap();

        sync.logout(&mut store).await.unwrap();
        assert!(store.is_empty());
        assert_eq!(
            backend.calls(),
            vec!["login asha@example.com", "fetch", "clear", "logout"]
        );
    }

    #[tokio::test]
    async fn test_logout_empties_local_cart_even_when_backend_fails() {
        let backend = FakeBackend::with(|s| {
            s.fail_mutations = true;
            s.fail_logout = true;
        });
        let sync = SyncAdapter::new(backend);
        let mut store = CartStore::new();
        store.dispatch(CartAction::Add(line("A", "9", 2)));

        assert!(sync.logout(&mut store).await.is_err());
        assert!(store.is_empty());
    }
}
