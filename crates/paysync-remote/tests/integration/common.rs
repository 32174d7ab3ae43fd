//! Shared test helpers for REST adapter integration tests
//!
//! Provides a wiremock server, a fixed-token auth provider and sample rows.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use wiremock::MockServer;

use paysync_core::domain::{Category, CurrencyCode, PaymentId, UserId};
use paysync_core::ports::{AuthError, IAuthProvider, RemotePaymentDto};
use paysync_remote::{RestClient, RestPaymentStore};

pub const TOKEN: &str = "test-access-token";
pub const TABLE_PATH: &str = "/rest/v1/payments";

/// Auth provider that always returns the same user and token
pub struct FixedAuth {
    pub user_id: UserId,
}

#[async_trait::async_trait]
impl IAuthProvider for FixedAuth {
    async fn current_user_id(&self) -> Result<UserId, AuthError> {
        Ok(self.user_id)
    }

    async fn access_token(&self) -> Result<String, AuthError> {
        Ok(TOKEN.to_string())
    }
}

pub fn user() -> UserId {
    "6f1c2a9e-3b4d-4e5f-8a9b-0c1d2e3f4a5b".parse().unwrap()
}

pub fn other_user() -> UserId {
    "0a0b0c0d-1111-4222-8333-444455556666".parse().unwrap()
}

/// Starts a mock server and returns a store pointing at it
pub async fn setup_store() -> (MockServer, RestPaymentStore) {
    let server = MockServer::start().await;
    let client = RestClient::with_base_url(server.uri(), Arc::new(FixedAuth { user_id: user() }))
        .with_api_key("anon-key");
    (server, RestPaymentStore::new(client, "payments"))
}

pub fn row(owner: UserId, name: &str) -> RemotePaymentDto {
    RemotePaymentDto {
        id: PaymentId::new(),
        user_id: owner,
        name: name.to_string(),
        amount: Decimal::new(1999, 2),
        currency: CurrencyCode::new("EUR").unwrap(),
        due_date: Utc.with_ymd_and_hms(2026, 11, 15, 0, 0, 0).unwrap(),
        is_paid: false,
        category: Category::Subscriptions,
        event_ref: None,
        group_id: None,
    }
}
