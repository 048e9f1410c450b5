//! Account registration against the session endpoints.

#![allow(clippy::unwrap_used)]

use emporium_integration_tests::{FakeBackend, SHOPPER_EMAIL};
use emporium_storefront::api::{Credentials, Registration};
use emporium_storefront::{ApiError, CartStore, SessionApi, SessionStatus, SyncAdapter};

#[tokio::test]
async fn test_registered_account_can_log_in() {
    let backend = FakeBackend::start().await;
    let client = backend.client();

    let message = client
        .register(&Registration::new("Mei", "mei@example.com", "plum blossom rain"))
        .await
        .unwrap();
    assert_eq!(message, "User registered successfully");

    // Registering opens no session
    assert!(client.current_user().await.unwrap().is_none());

    let shopper = backend
        .login(&Credentials::new("mei@example.com", "plum blossom rain"))
        .await;
    assert!(shopper.store.is_empty());
    assert_eq!(
        shopper.client.current_user().await.unwrap().unwrap().name,
        "Mei"
    );
}

#[tokio::test]
async fn test_duplicate_email_is_rejected_with_server_message() {
    let backend = FakeBackend::start().await;

    let err = backend
        .client()
        .register(&Registration::new("Asha again", SHOPPER_EMAIL, "another secret"))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Rejected { status: 400, .. }));
    assert_eq!(err.server_message(), Some("User already exists"));
}

#[tokio::test]
async fn test_wrong_password_for_new_account_is_refused() {
    let backend = FakeBackend::start().await;
    let client = backend.client();
    client
        .register(&Registration::new("Mei", "mei@example.com", "plum blossom rain"))
        .await
        .unwrap();

    let sync = SyncAdapter::new(client);
    let mut store = CartStore::new();
    let err = sync
        .login(&mut store, &Credentials::new("mei@example.com", "wrong"))
        .await
        .unwrap_err();

    assert_eq!(err.server_message(), Some("Invalid email or password"));
    assert!(matches!(sync.bootstrap(&mut store).await, SessionStatus::Anonymous));
}
