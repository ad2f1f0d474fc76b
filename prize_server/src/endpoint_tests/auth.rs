use actix_web::{http::StatusCode, test::TestRequest};

use super::helpers::{new_test_db, request, TEST_TOKEN};
use crate::player::PlayerHub;

#[actix_web::test]
async fn health_does_not_require_a_token() {
    let db = new_test_db().await;
    let hub = PlayerHub::default();
    let (status, body) = request(&db, &hub, TestRequest::get().uri("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_str().unwrap(), "👍️\n");
}

#[actix_web::test]
async fn api_requests_without_a_token_are_rejected() {
    let db = new_test_db().await;
    let hub = PlayerHub::default();
    let (status, body) = request(&db, &hub, TestRequest::get().uri("/voucher")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Invalid or missing bearer token");
}

#[actix_web::test]
async fn api_requests_with_the_wrong_token_are_rejected() {
    let db = new_test_db().await;
    let hub = PlayerHub::default();
    let req = TestRequest::get().uri("/prize").insert_header(("Authorization", "Bearer not-the-token"));
    let (status, body) = request(&db, &hub, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Invalid or missing bearer token");
}

#[actix_web::test]
async fn a_token_without_the_bearer_prefix_is_rejected() {
    let db = new_test_db().await;
    let hub = PlayerHub::default();
    let req = TestRequest::get().uri("/prize").insert_header(("Authorization", TEST_TOKEN));
    let (status, _) = request(&db, &hub, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
