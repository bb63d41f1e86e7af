//! Shared test helpers for record API integration tests
//!
//! Each helper mounts mock endpoints on a wiremock server; the store is
//! configured to point at that server.

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mindsync_core::domain::MindMap;
use mindsync_core::ports::RemoteStoreError;
use mindsync_core::schema::{Record, RecordMapping};
use mindsync_remote::{HttpRemoteStore, RemoteClient};

/// Starts a mock server and returns it with a store pointing at it.
///
/// Pre-configured endpoints:
/// - GET /account → available
pub async fn setup_remote_mock() -> (MockServer, HttpRemoteStore) {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/account"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "available"
        })))
        .mount(&server)
        .await;

    let store = HttpRemoteStore::new(RemoteClient::with_base_url("test-access-token", server.uri()));

    (server, store)
}

/// Returns a store with no endpoints mounted.
pub async fn setup_empty_mock() -> (MockServer, HttpRemoteStore) {
    let server = MockServer::start().await;
    let store = HttpRemoteStore::new(RemoteClient::with_base_url("test-access-token", server.uri()));
    (server, store)
}

/// A mind map record as the backend would return it.
pub fn mind_map_record(title: &str) -> Record {
    MindMap::new(title).to_record()
}

/// Finds the classified failure attached to an adapter error.
pub fn remote_error(err: &anyhow::Error) -> Option<RemoteStoreError> {
    err.chain()
        .find_map(|e| e.downcast_ref::<RemoteStoreError>())
        .cloned()
}
