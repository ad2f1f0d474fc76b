use actix_web::{http::StatusCode, test::TestRequest};
use serde_json::json;

use super::helpers::{authed, get, new_test_db, post, request};
use crate::player::PlayerHub;

#[actix_web::test]
async fn messages_can_be_recorded_listed_and_filtered() {
    let db = new_test_db().await;
    let hub = PlayerHub::default();
    let (status, rec) =
        post(&db, &hub, "/voucher-messages", json!({ "user_id": 1, "voucher_code": "0001", "message_id": 11 })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(rec["message_id"], 11);
    post(&db, &hub, "/voucher-messages", json!({ "user_id": 2, "voucher_code": "0002", "message_id": 22 })).await;

    let (status, body) = get(&db, &hub, "/voucher-messages").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body) = get(&db, &hub, "/voucher-messages?user_id=2").await;
    let hits = body.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["message_id"], 22);

    let (_, body) = get(&db, &hub, "/voucher-messages?voucher_code=0001").await;
    let hits = body.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["message_id"], 11);
}

#[actix_web::test]
async fn deleting_a_message_is_a_soft_delete() {
    let db = new_test_db().await;
    let hub = PlayerHub::default();
    let (_, rec) =
        post(&db, &hub, "/voucher-messages", json!({ "user_id": 1, "voucher_code": "0001", "message_id": 11 })).await;
    let id = rec["id"].as_i64().unwrap();

    let req = authed(TestRequest::delete().uri(&format!("/voucher-messages/{id}")));
    let (status, _) = request(&db, &hub, req).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // The record survives with a deleted marker and still shows up in unfiltered listings.
    let (_, body) = get(&db, &hub, "/voucher-messages").await;
    let hits = body.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert!(!hits[0]["deleted_at"].is_null());
    let (_, body) = get(&db, &hub, "/voucher-messages?active_only=false").await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    let (_, body) = get(&db, &hub, "/voucher-messages?active_only=true").await;
    assert!(body.as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn deleting_an_unknown_message_is_not_found() {
    let db = new_test_db().await;
    let hub = PlayerHub::default();
    let req = authed(TestRequest::delete().uri("/voucher-messages/9999"));
    let (status, body) = request(&db, &hub, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "The message record 9999 does not exist");
}
