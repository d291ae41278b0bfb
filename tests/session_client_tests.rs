//! Session client integration tests: state checks, redirect callbacks, and
//! the one consistent uninitialized-client policy.

mod common;

use std::sync::Arc;

use serde_json::json;

use common::{object, MockProvider};
use wicket::host::{MemoryNavigator, Navigation, Navigator};
use wicket::session::{AuthError, SessionClient};
use wicket::storage::{KeyValueStore, MemoryStore, RETURN_TO_KEY};

fn client(url: &str) -> (Arc<MemoryNavigator>, Arc<MemoryStore>, SessionClient) {
    let navigator = Arc::new(MemoryNavigator::new(url));
    let storage = Arc::new(MemoryStore::new());
    let client = SessionClient::new(
        Arc::clone(&navigator) as Arc<dyn Navigator>,
        Arc::clone(&storage) as Arc<dyn KeyValueStore>,
    );
    (navigator, storage, client)
}

#[tokio::test]
async fn initialize_checks_state_and_settles_snapshot() {
    let (_nav, _storage, client) = client("https://app.example/");
    let provider = Arc::new(MockProvider::new());
    provider.set_authenticated(object(json!({"sub": "user-1", "name": "Ada"})));

    assert!(client.snapshot().is_loading);
    client.initialize(provider).await.unwrap();

    let snap = client.snapshot();
    assert!(!snap.is_loading);
    assert!(snap.is_authenticated);
    assert_eq!(snap.user.unwrap()["name"], "Ada");
    assert!(snap.error.is_none());
}

#[tokio::test]
async fn failed_check_discards_previous_user() {
    let (_nav, _storage, client) = client("https://app.example/");
    let provider = Arc::new(MockProvider::new());
    provider.set_authenticated(object(json!({"sub": "user-1"})));
    client.initialize(provider.clone()).await.unwrap();
    assert!(client.snapshot().user.is_some());

    provider.set_check_error("network down");
    client.check_state().await.unwrap();

    let snap = client.snapshot();
    assert!(!snap.is_loading);
    assert!(!snap.is_authenticated);
    assert!(snap.user.is_none());
    assert!(snap.error.unwrap().contains("network down"));
}

#[tokio::test]
async fn initialize_runs_redirect_callback_when_code_present() {
    let (nav, storage, client) = client("https://app.example/cb?code=abc&state=s1");
    storage.set(RETURN_TO_KEY, "/profile").unwrap();
    let provider = Arc::new(MockProvider::new());

    client.initialize(provider.clone()).await.unwrap();

    assert_eq!(
        provider.exchange_calls(),
        vec![("abc".to_string(), "s1".to_string())]
    );
    let snap = client.snapshot();
    assert!(snap.is_authenticated);
    // Return target consumed and the address rewritten to it.
    assert!(storage.get(RETURN_TO_KEY).unwrap().is_none());
    assert_eq!(
        nav.history().last().unwrap(),
        &Navigation::Replace("/profile".to_string())
    );
}

#[tokio::test]
async fn redirect_callback_without_target_falls_back_to_root() {
    let (nav, _storage, client) = client("https://app.example/cb?code=abc&state=s1");
    let provider = Arc::new(MockProvider::new());
    client.initialize(provider).await.unwrap();
    assert_eq!(
        nav.history().last().unwrap(),
        &Navigation::Replace("/".to_string())
    );
}

#[tokio::test]
async fn failed_exchange_records_error_and_strips_query() {
    let (nav, _storage, client) = client("https://app.example/cb?code=abc&state=s1");
    let provider = Arc::new(MockProvider::new());
    provider.set_exchange_error("exchange refused");

    client.initialize(provider).await.unwrap();

    let snap = client.snapshot();
    assert!(snap.error.unwrap().contains("exchange refused"));
    assert!(!snap.is_authenticated);
    assert_eq!(
        nav.history().last().unwrap(),
        &Navigation::Replace("/cb".to_string())
    );
}

#[tokio::test]
async fn error_parameter_short_circuits_the_callback() {
    let (nav, _storage, client) =
        client("https://app.example/cb?error=access_denied&error_description=User%20cancelled");
    let provider = Arc::new(MockProvider::new());

    client.initialize(provider.clone()).await.unwrap();

    assert!(provider.exchange_calls().is_empty());
    let snap = client.snapshot();
    assert_eq!(snap.error.as_deref(), Some("User cancelled"));
    assert_eq!(
        nav.history().last().unwrap(),
        &Navigation::Replace("/cb".to_string())
    );
}

#[tokio::test]
async fn uninitialized_operations_fail_with_typed_error() {
    let (_nav, _storage, client) = client("https://app.example/");
    assert!(matches!(
        client.login_with_redirect(None).await,
        Err(AuthError::NotInitialized)
    ));
    assert!(matches!(
        client.logout(None).await,
        Err(AuthError::NotInitialized)
    ));
    assert!(matches!(
        client.check_state().await,
        Err(AuthError::NotInitialized)
    ));
    assert!(matches!(
        client.login_with_popup().await,
        Err(AuthError::NotInitialized)
    ));
    // get_access_token's contract is token-or-null: it logs instead.
    assert!(client.get_access_token().await.is_none());
}

#[tokio::test]
async fn login_with_redirect_persists_target_and_navigates() {
    let (nav, storage, client) = client("https://app.example/");
    client.initialize(Arc::new(MockProvider::new())).await.unwrap();

    client.login_with_redirect(Some("/after")).await.unwrap();

    assert_eq!(storage.get(RETURN_TO_KEY).unwrap().as_deref(), Some("/after"));
    assert_eq!(
        nav.history().last().unwrap(),
        &Navigation::Assign("https://idp.example/authorize?client_id=mock&state=s1".to_string())
    );
}

#[tokio::test]
async fn popup_failure_lowers_loading_and_keeps_auth_state() {
    let (_nav, _storage, client) = client("https://app.example/");
    let provider = Arc::new(MockProvider::new());
    provider.set_authenticated(object(json!({"sub": "user-1"})));
    client.initialize(provider.clone()).await.unwrap();

    provider.set_popup_error("window blocked");
    client.login_with_popup().await.unwrap();

    let snap = client.snapshot();
    assert!(!snap.is_loading);
    assert!(snap.error.unwrap().contains("window blocked"));
    // A later failure does not contradict the confirmed session.
    assert!(snap.is_authenticated);
    assert!(snap.user.is_some());
}

#[tokio::test]
async fn popup_success_rechecks_state() {
    let (_nav, _storage, client) = client("https://app.example/");
    let provider = Arc::new(MockProvider::new());
    client.initialize(provider.clone()).await.unwrap();
    assert!(!client.snapshot().is_authenticated);

    client.login_with_popup().await.unwrap();

    let snap = client.snapshot();
    assert!(!snap.is_loading);
    assert!(snap.is_authenticated);
}

#[tokio::test]
async fn logout_navigates_without_local_cleanup() {
    let (nav, _storage, client) = client("https://app.example/");
    let provider = Arc::new(MockProvider::new());
    provider.set_authenticated(object(json!({"sub": "user-1"})));
    client.initialize(provider).await.unwrap();

    client.logout(Some("https://app.example/bye")).await.unwrap();

    assert_eq!(
        nav.history().last().unwrap(),
        &Navigation::Assign(
            "https://idp.example/v2/logout?client_id=mock&returnTo=https://app.example/bye"
                .to_string()
        )
    );
    // Snapshot untouched; the provider redirect resets state.
    assert!(client.snapshot().is_authenticated);
}

#[tokio::test]
async fn errors_clear_only_explicitly() {
    let (_nav, _storage, client) = client("https://app.example/");
    let provider = Arc::new(MockProvider::new());
    provider.set_check_error("network down");
    client.initialize(provider.clone()).await.unwrap();
    assert!(client.snapshot().error.is_some());

    // A later unrelated operation leaves the error alone.
    client.login_with_redirect(None).await.unwrap();
    assert!(client.snapshot().error.is_some());

    client.clear_error();
    assert!(client.snapshot().error.is_none());
}
