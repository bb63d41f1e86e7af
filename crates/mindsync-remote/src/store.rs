//! HttpRemoteStore - IRemoteStore implementation over the record API
//!
//! | Operation        | Request                                   |
//! |------------------|-------------------------------------------|
//! | account_status   | `GET /account`                            |
//! | fetch_records    | `GET /records/{type}`                     |
//! | query_records    | `GET /records/{type}?field=F&equals=V`    |
//! | fetch_record     | `GET /records/{type}/{name}`              |
//! | save_record      | `PUT /records/{type}/{name}`              |
//! | delete_record    | `DELETE /records/{type}/{name}`           |
//!
//! ## Design Notes
//!
//! - Uses `tokio::sync::RwLock` so the access token can be replaced while
//!   `IRemoteStore` methods only take `&self`.
//! - A 404 on fetch means "no such record"; a 404 on delete is success.

use anyhow::Result;
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, trace};

use mindsync_core::ports::{AccountStatus, IRemoteStore, RemoteStoreError};
use mindsync_core::schema::Record;

use crate::client::RemoteClient;

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Deserialize)]
struct AccountResponse {
    status: AccountStatus,
}

#[derive(Debug, Deserialize)]
struct RecordsResponse {
    records: Vec<Record>,
}

// ============================================================================
// HttpRemoteStore
// ============================================================================

/// Remote store backed by the MindSync record API
pub struct HttpRemoteStore {
    client: RwLock<RemoteClient>,
}

impl HttpRemoteStore {
    pub fn new(client: RemoteClient) -> Self {
        Self {
            client: RwLock::new(client),
        }
    }

    /// Replaces the bearer token used for subsequent requests
    pub async fn set_access_token(&self, token: impl Into<String>) {
        self.client.write().await.set_access_token(token);
    }

    async fn send(&self, method: Method, path: &str) -> Result<Response> {
        let what = format!("{method} {path}");
        let client = self.client.read().await;
        client.execute(client.request(method, path), &what).await
    }
}

fn records_path(record_type: &str) -> String {
    format!("/records/{record_type}")
}

fn record_path(record_type: &str, record_name: &str) -> String {
    format!("/records/{record_type}/{record_name}")
}

/// Decodes a JSON body, classifying failures as malformed records
async fn decode<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
    response.json::<T>().await.map_err(|e| {
        anyhow::Error::new(RemoteStoreError::MalformedRecord(e.to_string()))
            .context(format!("Failed to parse {what} response"))
    })
}

#[async_trait::async_trait]
impl IRemoteStore for HttpRemoteStore {
    async fn account_status(&self) -> Result<AccountStatus> {
        let response = self.send(Method::GET, "/account").await?;
        let response = RemoteClient::ensure_success(response, "GET /account").await?;
        let account: AccountResponse = decode(response, "GET /account").await?;

        debug!(status = ?account.status, "Fetched account status");
        Ok(account.status)
    }

    async fn fetch_records(&self, record_type: &str) -> Result<Vec<Record>> {
        let path = records_path(record_type);
        let what = format!("GET {path}");

        let response = self.send(Method::GET, &path).await?;
        let response = RemoteClient::ensure_success(response, &what).await?;
        let body: RecordsResponse = decode(response, &what).await?;

        debug!(record_type, count = body.records.len(), "Fetched records");
        Ok(body.records)
    }

    async fn query_records(
        &self,
        record_type: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<Record>> {
        let path = records_path(record_type);
        let what = format!("GET {path}?field={field}");

        let response = {
            let client = self.client.read().await;
            let builder = client
                .request(Method::GET, &path)
                .query(&[("field", field), ("equals", value)]);
            client.execute(builder, &what).await?
        };
        let response = RemoteClient::ensure_success(response, &what).await?;
        let body: RecordsResponse = decode(response, &what).await?;

        debug!(
            record_type,
            field,
            value,
            count = body.records.len(),
            "Queried records"
        );
        Ok(body.records)
    }

    async fn fetch_record(&self, record_type: &str, record_name: &str) -> Result<Option<Record>> {
        let path = record_path(record_type, record_name);
        let what = format!("GET {path}");

        let response = self.send(Method::GET, &path).await?;
        if response.status() == StatusCode::NOT_FOUND {
            trace!(record_type, record_name, "Record not found");
            return Ok(None);
        }
        let response = RemoteClient::ensure_success(response, &what).await?;
        let record: Record = decode(response, &what).await?;

        Ok(Some(record))
    }

    async fn save_record(&self, record: &Record) -> Result<()> {
        let path = record_path(&record.record_type, &record.record_name);
        let what = format!("PUT {path}");

        let response = {
            let client = self.client.read().await;
            let builder = client.request(Method::PUT, &path).json(record);
            client.execute(builder, &what).await?
        };
        RemoteClient::ensure_success(response, &what).await?;

        debug!(
            record_type = %record.record_type,
            record_name = %record.record_name,
            "Saved record"
        );
        Ok(())
    }

    async fn delete_record(&self, record_type: &str, record_name: &str) -> Result<()> {
        let path = record_path(record_type, record_name);
        let what = format!("DELETE {path}");

        let response = self.send(Method::DELETE, &path).await?;
        if response.status() == StatusCode::NOT_FOUND {
            trace!(record_type, record_name, "Record already absent");
            return Ok(());
        }
        RemoteClient::ensure_success(response, &what).await?;

        debug!(record_type, record_name, "Deleted record");
        Ok(())
    }
}
