//! Integration tests for record CRUD endpoints

use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use mindsync_core::domain::{MindMap, MindMapId, Node, Position};
use mindsync_core::ports::IRemoteStore;
use mindsync_core::schema::{node_fields, record_types, RecordMapping};

use crate::common;

#[tokio::test]
async fn test_fetch_records_decodes_list() {
    let (server, store) = common::setup_remote_mock().await;
    let first = common::mind_map_record("First");
    let second = common::mind_map_record("Second");

    Mock::given(method("GET"))
        .and(path("/records/MindMap"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "records": [first, second]
        })))
        .mount(&server)
        .await;

    let records = store
        .fetch_records(record_types::MIND_MAP)
        .await
        .expect("fetch_records failed");

    assert_eq!(records, vec![first.clone(), second]);
    let decoded = MindMap::from_record(&records[0]).unwrap();
    assert_eq!(decoded.title(), "First");
}

#[tokio::test]
async fn test_fetch_records_empty() {
    let (server, store) = common::setup_remote_mock().await;
    Mock::given(method("GET"))
        .and(path("/records/MindMap"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "records": []
        })))
        .mount(&server)
        .await;

    assert!(store
        .fetch_records(record_types::MIND_MAP)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_query_records_sends_field_filter() {
    let (server, store) = common::setup_remote_mock().await;
    let mind_map_id = MindMapId::new();
    let node = Node::new(mind_map_id, "Child", Position::new(1.0, 2.0));

    Mock::given(method("GET"))
        .and(path("/records/Node"))
        .and(query_param("field", node_fields::MIND_MAP_ID))
        .and(query_param("equals", mind_map_id.to_string().as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "records": [node.to_record()]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let records = store
        .query_records(
            record_types::NODE,
            node_fields::MIND_MAP_ID,
            &mind_map_id.to_string(),
        )
        .await
        .expect("query_records failed");

    assert_eq!(records.len(), 1);
    assert_eq!(Node::from_record(&records[0]).unwrap(), node);
}

#[tokio::test]
async fn test_fetch_record_found() {
    let (server, store) = common::setup_remote_mock().await;
    let record = common::mind_map_record("Single");
    let record_path = format!("/records/MindMap/{}", record.record_name);

    Mock::given(method("GET"))
        .and(path(record_path.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(&record))
        .mount(&server)
        .await;

    let fetched = store
        .fetch_record(record_types::MIND_MAP, &record.record_name)
        .await
        .unwrap();
    assert_eq!(fetched, Some(record));
}

#[tokio::test]
async fn test_fetch_record_not_found_is_none() {
    let (server, store) = common::setup_remote_mock().await;
    Mock::given(method("GET"))
        .and(path("/records/MindMap/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetched = store
        .fetch_record(record_types::MIND_MAP, "missing")
        .await
        .unwrap();
    assert!(fetched.is_none());
}

#[tokio::test]
async fn test_save_record_puts_body() {
    let (server, store) = common::setup_remote_mock().await;
    let record = common::mind_map_record("Saved");
    let record_path = format!("/records/MindMap/{}", record.record_name);

    Mock::given(method("PUT"))
        .and(path(record_path.as_str()))
        .and(body_json(&record))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    store.save_record(&record).await.expect("save_record failed");
}

#[tokio::test]
async fn test_delete_record() {
    let (server, store) = common::setup_remote_mock().await;
    Mock::given(method("DELETE"))
        .and(path("/records/Node/abc"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    store
        .delete_record(record_types::NODE, "abc")
        .await
        .expect("delete_record failed");
}

#[tokio::test]
async fn test_delete_missing_record_succeeds() {
    let (server, store) = common::setup_remote_mock().await;
    Mock::given(method("DELETE"))
        .and(path("/records/Node/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    store.delete_record(record_types::NODE, "gone").await.unwrap();
}
