//! Integration tests for HTTP failure classification

use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use mindsync_core::ports::{IRemoteStore, RemoteStoreError};
use mindsync_core::schema::record_types;
use mindsync_remote::{HttpRemoteStore, RemoteClient};

use crate::common;

async fn save_error(status: u16) -> RemoteStoreError {
    let (server, store) = common::setup_remote_mock().await;
    let record = common::mind_map_record("Failing");
    let record_path = format!("/records/MindMap/{}", record.record_name);

    Mock::given(method("PUT"))
        .and(path(record_path.as_str()))
        .respond_with(ResponseTemplate::new(status))
        .mount(&server)
        .await;

    let err = store.save_record(&record).await.unwrap_err();
    common::remote_error(&err).expect("error should carry a RemoteStoreError")
}

#[tokio::test]
async fn test_quota_statuses() {
    assert_eq!(save_error(413).await, RemoteStoreError::QuotaExceeded);
    assert_eq!(save_error(507).await, RemoteStoreError::QuotaExceeded);
}

#[tokio::test]
async fn test_rate_limited_is_transient() {
    let err = save_error(429).await;
    assert_eq!(err, RemoteStoreError::RateLimited);
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_server_error_is_unavailable() {
    let err = save_error(503).await;
    assert!(matches!(err, RemoteStoreError::Unavailable(_)));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_forbidden() {
    assert!(matches!(
        save_error(403).await,
        RemoteStoreError::Forbidden(_)
    ));
}

#[tokio::test]
async fn test_malformed_body() {
    let (server, store) = common::setup_remote_mock().await;
    Mock::given(method("GET"))
        .and(path("/records/MindMap"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = store
        .fetch_records(record_types::MIND_MAP)
        .await
        .unwrap_err();
    assert!(matches!(
        common::remote_error(&err),
        Some(RemoteStoreError::MalformedRecord(_))
    ));
}

#[tokio::test]
async fn test_connection_refused_is_unavailable() {
    // Nothing listens on port 1
    let store = HttpRemoteStore::new(RemoteClient::with_base_url("token", "http://127.0.0.1:1"));

    let err = store.account_status().await.unwrap_err();
    assert!(matches!(
        common::remote_error(&err),
        Some(RemoteStoreError::Unavailable(_))
    ));
}
