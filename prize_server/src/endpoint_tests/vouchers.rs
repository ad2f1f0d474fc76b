use actix_web::http::StatusCode;
use serde_json::json;

use super::helpers::{get, issue_voucher, new_test_db, post, put};
use crate::player::PlayerHub;

#[actix_web::test]
async fn issuing_returns_a_four_digit_code() {
    let db = new_test_db().await;
    let hub = PlayerHub::default();
    let voucher = issue_voucher(&db, &hub, 100, 3).await;
    let code = voucher["code"].as_str().unwrap();
    assert_eq!(code.len(), 4);
    assert!(code.chars().all(|c| c.is_ascii_digit()));
    assert_eq!(voucher["user_id"], 100);
    assert_eq!(voucher["total_games"], 3);
    assert_eq!(voucher["use_count"], 0);
}

#[actix_web::test]
async fn code_lookup_distinguishes_unknown_from_exhausted() {
    let db = new_test_db().await;
    let hub = PlayerHub::default();
    let voucher = issue_voucher(&db, &hub, 100, 1).await;
    let code = voucher["code"].as_str().unwrap();

    let (status, body) = get(&db, &hub, &format!("/voucher/code/{code}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], voucher["id"]);

    let (status, body) = get(&db, &hub, "/voucher/code/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "The voucher with code [nope] does not exist");

    // Spend the only game, then the code answers 410 instead of 404.
    let id = voucher["id"].as_i64().unwrap();
    let (status, _) = put(&db, &hub, &format!("/voucher/{id}/play"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = get(&db, &hub, &format!("/voucher/code/{code}")).await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body["detail"], format!("The voucher [{code}] has no remaining games"));
}

#[actix_web::test]
async fn playing_counts_games_and_stops_at_capacity() {
    let db = new_test_db().await;
    let hub = PlayerHub::default();
    let voucher = issue_voucher(&db, &hub, 7, 2).await;
    let id = voucher["id"].as_i64().unwrap();
    let path = format!("/voucher/{id}/play");

    let (status, body) = put(&db, &hub, &path, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["use_count"], 1);
    let (status, body) = put(&db, &hub, &path, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["use_count"], 2);

    let (status, body) = put(&db, &hub, &path, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Voucher has no remaining games");

    let (status, _) = put(&db, &hub, "/voucher/9999/play", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn capacity_adjustments_take_exactly_one_parameter() {
    let db = new_test_db().await;
    let hub = PlayerHub::default();
    let voucher = issue_voucher(&db, &hub, 7, 1).await;
    let id = voucher["id"].as_i64().unwrap();

    let (status, body) = put(&db, &hub, &format!("/voucher/{id}/count?add=1&set=5"), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Could not read request body: Provide exactly one of 'add', 'decrease' or 'set'");

    let (status, body) = put(&db, &hub, &format!("/voucher/{id}/count"), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Could not read request body: Provide exactly one of 'add', 'decrease' or 'set'");

    let (status, body) = put(&db, &hub, &format!("/voucher/{id}/count?add=4"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_games"], 5);

    let (status, body) = put(&db, &hub, &format!("/voucher/{id}/count?set=2"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_games"], 2);

    let (status, body) = put(&db, &hub, &format!("/voucher/{id}/count?decrease=1"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_games"], 1);
}

#[actix_web::test]
async fn the_redeem_path_plays_by_code() {
    let db = new_test_db().await;
    let hub = PlayerHub::default();
    let voucher = issue_voucher(&db, &hub, 42, 1).await;
    let code = voucher["code"].as_str().unwrap();

    let (status, body) = post(&db, &hub, "/voucher/used", json!({ "code": code })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["use_count"], 1);

    let (status, body) = post(&db, &hub, "/voucher/used", json!({ "code": code })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Voucher has no remaining games");

    let (status, body) = post(&db, &hub, "/voucher/used", json!({ "code": "0000" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "The voucher with code [0000] does not exist");
}

#[actix_web::test]
async fn the_search_endpoint_filters_by_user_and_activity() {
    let db = new_test_db().await;
    let hub = PlayerHub::default();
    issue_voucher(&db, &hub, 1, 1).await;
    issue_voucher(&db, &hub, 2, 1).await;
    let spent = issue_voucher(&db, &hub, 2, 1).await;
    let id = spent["id"].as_i64().unwrap();
    put(&db, &hub, &format!("/voucher/{id}/play"), json!({})).await;

    let (status, body) = get(&db, &hub, "/voucher?user_id=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body) = get(&db, &hub, "/voucher?user_id=2&active_only=true").await;
    let hits = body.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_ne!(hits[0]["id"], spent["id"]);

    let (_, body) = get(&db, &hub, "/voucher?active_only=true").await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    // An explicit `false` is the same as no filter at all.
    let (_, body) = get(&db, &hub, "/voucher?user_id=2&active_only=false").await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body) = get(&db, &hub, "/voucher").await;
    assert_eq!(body.as_array().unwrap().len(), 3);

    let (_, body) = get(&db, &hub, "/voucher?limit=2&offset=2").await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}
