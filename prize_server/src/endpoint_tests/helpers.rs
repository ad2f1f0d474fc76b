use actix_web::{body::to_bytes, http::StatusCode, test, test::TestRequest, web, App};
use ppg_common::Secret;
use prize_engine::{
    events::EventProducers,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    DrawApi,
    LedgerApi,
    MessageApi,
    SqliteDatabase,
};
use serde_json::{json, Value};

use crate::{
    player::{PlayerHub, WsSink},
    routes,
    server::api_scope,
};

pub const TEST_TOKEN: &str = "test-api-token";

pub async fn new_test_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating test database")
}

pub fn authed(req: TestRequest) -> TestRequest {
    req.insert_header(("Authorization", format!("Bearer {TEST_TOKEN}")))
}

/// Builds the production app (admin scope plus health route) around the given backend and hub,
/// and runs one request against it.
pub async fn request(db: &SqliteDatabase, hub: &PlayerHub<WsSink>, req: TestRequest) -> (StatusCode, Value) {
    let producers = EventProducers::default();
    let app = App::new()
        .app_data(web::Data::new(LedgerApi::new(db.clone(), producers.clone())))
        .app_data(web::Data::new(DrawApi::new(db.clone(), producers)))
        .app_data(web::Data::new(MessageApi::new(db.clone())))
        .app_data(web::Data::new(db.clone()))
        .app_data(web::Data::new(hub.clone()))
        .service(routes::health)
        .service(api_scope(&Secret::new(TEST_TOKEN.to_string())));
    let service = test::init_service(app).await;
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            let body = test::read_body(res).await;
            (status, parse_body(&body))
        },
        // Middleware rejections surface as errors rather than responses here.
        Err(e) => {
            let res = e.error_response();
            let status = res.status();
            let body = to_bytes(res.into_body()).await.expect("Could not read the error body");
            (status, parse_body(&body))
        },
    }
}

fn parse_body(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

pub async fn get(db: &SqliteDatabase, hub: &PlayerHub<WsSink>, path: &str) -> (StatusCode, Value) {
    request(db, hub, authed(TestRequest::get().uri(path))).await
}

pub async fn post(db: &SqliteDatabase, hub: &PlayerHub<WsSink>, path: &str, body: Value) -> (StatusCode, Value) {
    request(db, hub, authed(TestRequest::post().uri(path).set_json(body))).await
}

pub async fn put(db: &SqliteDatabase, hub: &PlayerHub<WsSink>, path: &str, body: Value) -> (StatusCode, Value) {
    request(db, hub, authed(TestRequest::put().uri(path).set_json(body))).await
}

/// Issues a voucher through the API and returns the response body.
pub async fn issue_voucher(
    db: &SqliteDatabase,
    hub: &PlayerHub<WsSink>,
    user_id: i64,
    total_games: i64,
) -> Value {
    let (status, body) =
        post(db, hub, "/voucher", json!({ "user_id": user_id, "total_games": total_games })).await;
    assert_eq!(status, StatusCode::CREATED, "voucher issue failed: {body}");
    body
}
