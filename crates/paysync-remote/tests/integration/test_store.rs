//! Request/response behaviour of RestPaymentStore

use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use paysync_core::domain::PaymentId;
use paysync_core::ports::{IRemoteStore, RemotePaymentDto};

use crate::common::{self, other_user, row, user, TABLE_PATH, TOKEN};

// ============================================================================
// fetch_all_for_user
// ============================================================================

#[tokio::test]
async fn test_fetch_all_for_user_sends_filter_and_auth() {
    let (server, store) = common::setup_store().await;
    let rows = vec![row(user(), "Netflix"), row(user(), "Spotify")];

    Mock::given(method("GET"))
        .and(path(TABLE_PATH))
        .and(query_param("user_id", format!("eq.{}", user())))
        .and(query_param("select", "*"))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .and(header("apikey", "anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&rows))
        .expect(1)
        .mount(&server)
        .await;

    let fetched = store.fetch_all_for_user(&user()).await.unwrap();
    assert_eq!(fetched, rows);
}

#[tokio::test]
async fn test_fetch_all_for_user_drops_foreign_rows() {
    let (server, store) = common::setup_store().await;
    let mine = row(user(), "Mine");
    let theirs = row(other_user(), "Theirs");

    Mock::given(method("GET"))
        .and(path(TABLE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![&mine, &theirs]))
        .mount(&server)
        .await;

    let fetched = store.fetch_all_for_user(&user()).await.unwrap();
    assert_eq!(fetched, vec![mine]);
}

#[tokio::test]
async fn test_fetch_all_for_user_empty_table() {
    let (server, store) = common::setup_store().await;

    Mock::given(method("GET"))
        .and(path(TABLE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    assert!(store.fetch_all_for_user(&user()).await.unwrap().is_empty());
}

// ============================================================================
// upsert_many
// ============================================================================

#[tokio::test]
async fn test_upsert_many_posts_batch_with_merge_preference() {
    let (server, store) = common::setup_store().await;

    Mock::given(method("POST"))
        .and(path(TABLE_PATH))
        .and(query_param("on_conflict", "id"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let rows = vec![row(user(), "Rent"), row(user(), "Gas")];
    store.upsert_many(&user(), &rows).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let prefer = requests[0].headers.get("prefer").unwrap().to_str().unwrap();
    assert!(prefer.contains("resolution=merge-duplicates"));

    let sent: Vec<RemotePaymentDto> = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(sent, rows);
}

#[tokio::test]
async fn test_upsert_many_stamps_owner() {
    let (server, store) = common::setup_store().await;

    Mock::given(method("POST"))
        .and(path(TABLE_PATH))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    store
        .upsert_many(&user(), &[row(other_user(), "Mislabelled")])
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let sent: Vec<RemotePaymentDto> = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(sent[0].user_id, user());
}

#[tokio::test]
async fn test_upsert_many_empty_sends_nothing() {
    let (server, store) = common::setup_store().await;

    store.upsert_many(&user(), &[]).await.unwrap();

    assert!(server.received_requests().await.unwrap().is_empty());
}

// ============================================================================
// delete_by_id / delete_many
// ============================================================================

#[tokio::test]
async fn test_delete_by_id() {
    let (server, store) = common::setup_store().await;
    let id = PaymentId::new();

    Mock::given(method("DELETE"))
        .and(path(TABLE_PATH))
        .and(query_param("id", format!("eq.{id}")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    store.delete_by_id(&id).await.unwrap();
}

#[tokio::test]
async fn test_delete_by_id_missing_row_is_success() {
    let (server, store) = common::setup_store().await;

    Mock::given(method("DELETE"))
        .and(path(TABLE_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    store.delete_by_id(&PaymentId::new()).await.unwrap();
}

#[tokio::test]
async fn test_delete_many_uses_in_filter() {
    let (server, store) = common::setup_store().await;
    let a = PaymentId::new();
    let b = PaymentId::new();

    Mock::given(method("DELETE"))
        .and(path(TABLE_PATH))
        .and(query_param("id", format!("in.({a},{b})")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    store.delete_many(&[a, b]).await.unwrap();
}

#[tokio::test]
async fn test_delete_many_empty_sends_nothing() {
    let (server, store) = common::setup_store().await;

    store.delete_many(&[]).await.unwrap();

    assert!(server.received_requests().await.unwrap().is_empty());
}
