//! Classification of failed requests into RemoteError

use std::sync::Arc;

use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use paysync_core::domain::{PaymentId, UserId};
use paysync_core::ports::{AuthError, IAuthProvider, IRemoteStore, RemoteError};
use paysync_remote::{RestClient, RestPaymentStore};

use crate::common::{self, row, user, TABLE_PATH};

async fn fetch_with_status(status: u16, body: &str) -> RemoteError {
    let (server, store) = common::setup_store().await;
    Mock::given(method("GET"))
        .and(path(TABLE_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(&server)
        .await;

    store.fetch_all_for_user(&user()).await.unwrap_err()
}

#[tokio::test]
async fn test_401_is_unauthorized() {
    let err = fetch_with_status(401, r#"{"message":"JWT expired"}"#).await;
    assert!(matches!(err, RemoteError::Unauthorized(ref m) if m.contains("JWT expired")));
    assert!(err.is_auth());
}

#[tokio::test]
async fn test_403_is_forbidden() {
    let err = fetch_with_status(403, "permission denied").await;
    assert!(matches!(err, RemoteError::Forbidden(_)));
    assert!(!err.is_auth());
}

#[tokio::test]
async fn test_5xx_is_server_error() {
    let err = fetch_with_status(503, "unavailable").await;
    assert!(matches!(err, RemoteError::Server { status: 503, .. }));
}

#[tokio::test]
async fn test_other_status() {
    let err = fetch_with_status(400, "bad filter").await;
    assert!(matches!(err, RemoteError::Status { status: 400, .. }));
}

#[tokio::test]
async fn test_undecodable_body_is_invalid_response() {
    let err = fetch_with_status(200, "<html>not json</html>").await;
    assert!(matches!(err, RemoteError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_conflict_on_upsert() {
    let (server, store) = common::setup_store().await;
    Mock::given(method("POST"))
        .and(path(TABLE_PATH))
        .respond_with(ResponseTemplate::new(409).set_body_string("duplicate key"))
        .mount(&server)
        .await;

    let err = store
        .upsert_many(&user(), &[row(user(), "Dup")])
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::Conflict(_)));
}

#[tokio::test]
async fn test_delete_server_error_is_not_swallowed() {
    let (server, store) = common::setup_store().await;
    Mock::given(method("DELETE"))
        .and(path(TABLE_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = store.delete_by_id(&PaymentId::new()).await.unwrap_err();
    assert!(matches!(err, RemoteError::Server { status: 500, .. }));
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let server = wiremock::MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let client = RestClient::with_base_url(uri, Arc::new(common::FixedAuth { user_id: user() }));
    let store = RestPaymentStore::new(client, "payments");

    let err = store.fetch_all_for_user(&user()).await.unwrap_err();
    assert!(
        matches!(err, RemoteError::Network(_)),
        "expected network error, got {err:?}"
    );
}

struct SignedOut;

#[async_trait::async_trait]
impl IAuthProvider for SignedOut {
    async fn current_user_id(&self) -> Result<UserId, AuthError> {
        Err(AuthError::NotAuthenticated)
    }

    async fn access_token(&self) -> Result<String, AuthError> {
        Err(AuthError::NotAuthenticated)
    }
}

#[tokio::test]
async fn test_missing_token_fails_before_sending() {
    let server = wiremock::MockServer::start().await;
    let client = RestClient::with_base_url(server.uri(), Arc::new(SignedOut));
    let store = RestPaymentStore::new(client, "payments");

    let err = store.fetch_all_for_user(&user()).await.unwrap_err();
    assert!(matches!(err, RemoteError::Auth(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}
