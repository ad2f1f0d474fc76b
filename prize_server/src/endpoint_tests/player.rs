use actix_web::http::StatusCode;
use serde_json::json;

use super::helpers::{get, new_test_db, post};
use crate::player::PlayerHub;

#[actix_web::test]
async fn the_playlist_starts_empty_and_grows_via_the_api() {
    let db = new_test_db().await;
    let hub = PlayerHub::default();

    let (status, body) = get(&db, &hub, "/tracks").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());

    let (status, track) =
        post(&db, &hub, "/tracks", json!({ "title": "Macarena", "artist": "Los del Río", "added_by": 1 })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(track["title"], "Macarena");

    let (_, body) = get(&db, &hub, "/tracks").await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    // The hub picked up the new playlist as well.
    assert_eq!(hub.playlist().await.len(), 1);
}

#[actix_web::test]
async fn player_ops_drive_the_shared_state() {
    let db = new_test_db().await;
    let hub = PlayerHub::default();
    post(&db, &hub, "/tracks", json!({ "title": "A", "artist": "a", "added_by": 1 })).await;
    post(&db, &hub, "/tracks", json!({ "title": "B", "artist": "b", "added_by": 1 })).await;

    let (status, body) = post(&db, &hub, "/player/play", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["playing"], true);
    assert_eq!(body["index"], 0);
    assert_eq!(body["current"]["title"], "A");

    let (status, body) = post(&db, &hub, "/player/next", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["index"], 1);
    assert_eq!(body["current"]["title"], "B");

    let (status, body) = post(&db, &hub, "/player/pause", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["playing"], false);

    let (status, body) = post(&db, &hub, "/player/prev", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["index"], 0);
}

#[actix_web::test]
async fn shuffle_keeps_the_playlist_and_resets_the_index() {
    let db = new_test_db().await;
    let hub = PlayerHub::default();
    for title in ["A", "B", "C"] {
        post(&db, &hub, "/tracks", json!({ "title": title, "artist": "x", "added_by": 1 })).await;
    }
    post(&db, &hub, "/player/next", json!({})).await;

    let (status, body) = post(&db, &hub, "/player/shuffle", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["index"], 0);
    assert_eq!(body["track_count"], 3);
    let mut titles = hub.playlist().await.iter().map(|t| t.title.clone()).collect::<Vec<_>>();
    titles.sort();
    assert_eq!(titles, vec!["A", "B", "C"]);
}

#[actix_web::test]
async fn unknown_player_ops_are_not_found() {
    let db = new_test_db().await;
    let hub = PlayerHub::default();
    let (status, body) = post(&db, &hub, "/player/dance", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Unknown player op: dance");
}
