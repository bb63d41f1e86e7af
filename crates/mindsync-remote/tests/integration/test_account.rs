//! Integration tests for the account status endpoint

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

use mindsync_core::ports::{AccountStatus, IRemoteStore, RemoteStoreError};

use crate::common;

#[tokio::test]
async fn test_account_status_available() {
    let (_server, store) = common::setup_remote_mock().await;

    let status = store.account_status().await.expect("account_status failed");
    assert_eq!(status, AccountStatus::Available);
}

#[tokio::test]
async fn test_account_status_restricted() {
    let (server, store) = common::setup_empty_mock().await;
    Mock::given(method("GET"))
        .and(path("/account"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "restricted"
        })))
        .mount(&server)
        .await;

    assert_eq!(
        store.account_status().await.unwrap(),
        AccountStatus::Restricted
    );
}

#[tokio::test]
async fn test_requests_carry_bearer_token() {
    let (server, store) = common::setup_empty_mock().await;
    Mock::given(method("GET"))
        .and(path("/account"))
        .and(header("authorization", "Bearer refreshed-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "available"
        })))
        .expect(1)
        .mount(&server)
        .await;

    store.set_access_token("refreshed-token").await;
    store.account_status().await.unwrap();
}

#[tokio::test]
async fn test_account_status_unauthorized() {
    let (server, store) = common::setup_empty_mock().await;
    Mock::given(method("GET"))
        .and(path("/account"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = store.account_status().await.unwrap_err();
    assert_eq!(
        common::remote_error(&err),
        Some(RemoteStoreError::NotAuthenticated)
    );
}
