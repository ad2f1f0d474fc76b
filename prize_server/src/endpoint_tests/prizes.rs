use actix_web::http::StatusCode;
use serde_json::json;

use super::helpers::{get, issue_voucher, new_test_db, post, put};
use crate::player::PlayerHub;

#[actix_web::test]
async fn prize_creation_validates_names_and_rejects_duplicates() {
    let db = new_test_db().await;
    let hub = PlayerHub::default();

    let (status, body) =
        post(&db, &hub, "/prize", json!({ "name": "plush_toy", "friendly_name": "Plush toy", "remaining": 5 })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "plush_toy");

    let (status, body) = post(&db, &hub, "/prize", json!({ "name": "plush_toy", "friendly_name": "Again" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["detail"], "A prize named [plush_toy] already exists");

    let (status, body) = post(&db, &hub, "/prize", json!({ "name": "Not Valid!", "friendly_name": "Nope" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "[Not Valid!] is not a valid prize name");

    // Machine keys are lowercase alphanumerics and underscores only.
    let (status, body) = post(&db, &hub, "/prize", json!({ "name": "plush-toy", "friendly_name": "Nope" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "[plush-toy] is not a valid prize name");
}

#[actix_web::test]
async fn the_prize_list_shows_inventory() {
    let db = new_test_db().await;
    let hub = PlayerHub::default();
    post(&db, &hub, "/prize", json!({ "name": "sticker", "friendly_name": "Sticker", "remaining": 10 })).await;
    post(&db, &hub, "/prize", json!({ "name": "mug", "friendly_name": "Mug" })).await;

    let (status, body) = get(&db, &hub, "/prize").await;
    assert_eq!(status, StatusCode::OK);
    let prizes = body.as_array().unwrap();
    assert_eq!(prizes.len(), 2);
    assert_eq!(prizes[0]["remaining"], 10);
    // No inventory row means the prize is out of the draw pool.
    assert!(prizes[1]["remaining"].is_null());
}

#[actix_web::test]
async fn inventory_can_be_set_and_cleared() {
    let db = new_test_db().await;
    let hub = PlayerHub::default();
    let (_, prize) = post(&db, &hub, "/prize", json!({ "name": "mug", "friendly_name": "Mug" })).await;
    let id = prize["id"].as_i64().unwrap();

    let (status, _) = put(&db, &hub, &format!("/prize/{id}/remaining"), json!({ "remaining": 3 })).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = get(&db, &hub, "/prize").await;
    assert_eq!(body[0]["remaining"], 3);

    let (status, _) = put(&db, &hub, &format!("/prize/{id}/remaining"), json!({ "remaining": 0 })).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = get(&db, &hub, "/prize").await;
    assert!(body[0]["remaining"].is_null());

    let (status, _) = put(&db, &hub, "/prize/9999/remaining", json!({ "remaining": 1 })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn a_draw_consumes_a_game_and_records_a_win() {
    let db = new_test_db().await;
    let hub = PlayerHub::default();
    post(&db, &hub, "/prize", json!({ "name": "sticker", "friendly_name": "Sticker", "remaining": 5 })).await;
    let voucher = issue_voucher(&db, &hub, 55, 1).await;
    let code = voucher["code"].as_str().unwrap();

    let (status, body) = post(&db, &hub, "/draw", json!({ "voucher": code })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], 55);
    assert_eq!(body["prize"]["name"], "sticker");
    assert_eq!(body["voucher"]["use_count"], 1);

    let (status, body) = get(&db, &hub, "/wins").await;
    assert_eq!(status, StatusCode::OK);
    let wins = body.as_array().unwrap();
    assert_eq!(wins.len(), 1);
    assert_eq!(wins[0]["user_id"], 55);

    let (_, body) = get(&db, &hub, "/wins/count").await;
    assert_eq!(body["total"], 1);
}

#[actix_web::test]
async fn a_draw_against_an_empty_pool_is_a_conflict() {
    let db = new_test_db().await;
    let hub = PlayerHub::default();
    let voucher = issue_voucher(&db, &hub, 55, 1).await;
    let code = voucher["code"].as_str().unwrap();

    let (status, body) = post(&db, &hub, "/draw", json!({ "voucher": code })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["detail"], "No prizes remaining");

    // The failed draw did not consume the game.
    let (_, body) = get(&db, &hub, &format!("/voucher/code/{code}")).await;
    assert_eq!(body["use_count"], 0);
}

#[actix_web::test]
async fn the_win_log_pages_newest_first() {
    let db = new_test_db().await;
    let hub = PlayerHub::default();
    post(&db, &hub, "/prize", json!({ "name": "sticker", "friendly_name": "Sticker", "remaining": 10 })).await;
    let voucher = issue_voucher(&db, &hub, 1, 3).await;
    let code = voucher["code"].as_str().unwrap();
    for _ in 0..3 {
        let (status, _) = post(&db, &hub, "/draw", json!({ "voucher": code })).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = get(&db, &hub, "/wins?limit=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body) = get(&db, &hub, "/wins?limit=2&offset=2").await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, body) = get(&db, &hub, "/wins/count").await;
    assert_eq!(body["total"], 3);
}

#[actix_web::test]
async fn wins_can_be_scoped_to_one_user() {
    let db = new_test_db().await;
    let hub = PlayerHub::default();
    post(&db, &hub, "/prize", json!({ "name": "sticker", "friendly_name": "Sticker", "remaining": 10 })).await;
    let first = issue_voucher(&db, &hub, 1, 2).await;
    let second = issue_voucher(&db, &hub, 2, 1).await;
    let first_code = first["code"].as_str().unwrap();
    let second_code = second["code"].as_str().unwrap();
    post(&db, &hub, "/draw", json!({ "voucher": first_code })).await;
    post(&db, &hub, "/draw", json!({ "voucher": first_code })).await;
    post(&db, &hub, "/draw", json!({ "voucher": second_code })).await;

    let (status, body) = get(&db, &hub, "/wins/by-user/1").await;
    assert_eq!(status, StatusCode::OK);
    let wins = body.as_array().unwrap();
    assert_eq!(wins.len(), 2);
    assert!(wins.iter().all(|w| w["user_id"] == 1));

    let (_, body) = get(&db, &hub, "/wins/count?user_id=2").await;
    assert_eq!(body["total"], 1);
    let (_, body) = get(&db, &hub, "/wins/count?user_id=999").await;
    assert_eq!(body["total"], 0);
}
