//! RestPaymentStore - IRemoteStore implementation over the REST table API
//!
//! ## Endpoints
//!
//! | Operation            | Request                                                  |
//! |----------------------|----------------------------------------------------------|
//! | `fetch_all_for_user` | `GET {table}?user_id=eq.{uid}&select=*`                  |
//! | `upsert_many`        | `POST {table}?on_conflict=id`, `Prefer: resolution=merge-duplicates` |
//! | `delete_by_id`       | `DELETE {table}?id=eq.{id}`                              |
//! | `delete_many`        | `DELETE {table}?id=in.({id},{id},…)`                     |
//!
//! A 404 on delete means the row is already gone and counts as success,
//! which keeps a re-run of a partially failed pass harmless.

use reqwest::{Method, StatusCode};
use tracing::{debug, warn};

use paysync_core::domain::{PaymentId, UserId};
use paysync_core::ports::{IRemoteStore, RemoteError, RemotePaymentDto};

use crate::client::{transport_error, RestClient};

/// Remote payments table
pub struct RestPaymentStore {
    client: RestClient,
    table: String,
}

impl RestPaymentStore {
    pub fn new(client: RestClient, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }

    fn table_path(&self) -> String {
        format!("/{}", self.table)
    }
}

#[async_trait::async_trait]
impl IRemoteStore for RestPaymentStore {
    async fn fetch_all_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<RemotePaymentDto>, RemoteError> {
        let request = self
            .client
            .request(Method::GET, &self.table_path())
            .await?
            .query(&[("user_id", format!("eq.{user_id}")), ("select", "*".into())]);

        let response = self.client.send(request, &[]).await?;
        let body = response.bytes().await.map_err(transport_error)?;

        let rows: Vec<RemotePaymentDto> = serde_json::from_slice(&body)
            .map_err(|e| RemoteError::InvalidResponse(format!("payments list: {e}")))?;

        let total = rows.len();
        let owned: Vec<_> = rows
            .into_iter()
            .filter(|row| row.user_id == *user_id)
            .collect();
        if owned.len() != total {
            warn!(
                user_id = %user_id,
                dropped = total - owned.len(),
                "Ignoring rows owned by another user"
            );
        }

        debug!(user_id = %user_id, count = owned.len(), "Fetched remote payments");
        Ok(owned)
    }

    async fn upsert_many(
        &self,
        user_id: &UserId,
        rows: &[RemotePaymentDto],
    ) -> Result<(), RemoteError> {
        if rows.is_empty() {
            return Ok(());
        }

        let owned: Vec<RemotePaymentDto> = rows
            .iter()
            .cloned()
            .map(|mut row| {
                row.user_id = *user_id;
                row
            })
            .collect();

        let request = self
            .client
            .request(Method::POST, &self.table_path())
            .await?
            .query(&[("on_conflict", "id")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&owned);

        self.client.send(request, &[]).await?;

        debug!(user_id = %user_id, count = owned.len(), "Upserted remote payments");
        Ok(())
    }

    async fn delete_by_id(&self, id: &PaymentId) -> Result<(), RemoteError> {
        let request = self
            .client
            .request(Method::DELETE, &self.table_path())
            .await?
            .query(&[("id", format!("eq.{id}"))]);

        self.client.send(request, &[StatusCode::NOT_FOUND]).await?;

        debug!(payment_id = %id, "Deleted remote payment");
        Ok(())
    }

    async fn delete_many(&self, ids: &[PaymentId]) -> Result<(), RemoteError> {
        if ids.is_empty() {
            return Ok(());
        }

        let list = ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let request = self
            .client
            .request(Method::DELETE, &self.table_path())
            .await?
            .query(&[("id", format!("in.({list})"))]);

        self.client.send(request, &[StatusCode::NOT_FOUND]).await?;

        debug!(count = ids.len(), "Deleted remote payments");
        Ok(())
    }
}
