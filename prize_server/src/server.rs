use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use futures::FutureExt;
use log::*;
use prize_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    DrawApi,
    LedgerApi,
    LedgerQueries,
    MessageApi,
    SqliteDatabase,
};
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::{
    config::ServerConfig,
    delivery::TelegramDelivery,
    errors::ServerError,
    middleware::BearerTokenFactory,
    player::{player_ws, PlayerHub, WsSink},
    routes,
    sync_worker::start_sync_worker,
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    sqlx::migrate!("../prize_engine/src/db/sqlite/migrations")
        .run(db.pool())
        .await
        .map_err(|e| ServerError::InitializeError(format!("Could not run migrations: {e}")))?;

    let playlist = db.fetch_tracks().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let hub = PlayerHub::new(playlist);
    let producers = start_event_handlers(hub.clone()).await;

    let cancel = CancellationToken::new();
    if config.telegram_token.reveal().is_empty() {
        warn!("🕰️ No chat token configured. The voucher delivery worker is disabled.");
    } else {
        let delivery = Arc::new(TelegramDelivery::new(
            config.telegram_token.reveal(),
            Duration::from_secs(config.delivery_timeout_secs),
        ));
        start_sync_worker(db.clone(), delivery, Duration::from_secs(config.sync_interval_secs), cancel.clone());
    }

    let srv = create_server_instance(config, db, hub, producers)?;
    let result = srv.await.map_err(|e| ServerError::Unspecified(e.to_string()));
    cancel.cancel();
    result
}

/// Wires the engine's prize-won hook into the player hub so that every live WebSocket client
/// sees wins as they commit.
pub async fn start_event_handlers(hub: PlayerHub<WsSink>) -> EventProducers {
    let mut hooks = EventHooks::default();
    hooks.on_prize_won(move |event| {
        let hub = hub.clone();
        async move {
            info!(
                "🪝 [{}] won by user {}. Notifying live clients",
                event.result.prize.friendly_name, event.result.user_id
            );
            hub.broadcast_event(json!({
                "type": "prize_win",
                "user_id": event.result.user_id,
                "prize": event.result.prize,
                "won_at": event.result.won_at,
            }))
            .await;
        }
        .boxed()
    });
    let handlers = EventHandlers::new(25, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;
    producers
}

/// The bearer-guarded admin API. Everything except `/health` and the player WebSocket lives in
/// here. The same scope is mounted by the production server and the endpoint tests.
pub fn api_scope(api_token: &ppg_common::Secret<String>) -> impl actix_web::dev::HttpServiceFactory {
    web::scope("")
        .wrap(BearerTokenFactory::new(api_token))
        .route("/voucher", web::post().to(routes::issue_voucher::<SqliteDatabase>))
        .route("/voucher", web::get().to(routes::search_vouchers::<SqliteDatabase>))
        .route("/voucher/used", web::post().to(routes::redeem::<SqliteDatabase>))
        .route("/voucher/code/{code}", web::get().to(routes::voucher_by_code::<SqliteDatabase>))
        .route("/voucher/{id}/play", web::put().to(routes::play_game::<SqliteDatabase>))
        .route("/voucher/{id}/count", web::put().to(routes::adjust_games::<SqliteDatabase>))
        .route("/prize", web::post().to(routes::create_prize::<SqliteDatabase>))
        .route("/prize", web::get().to(routes::list_prizes::<SqliteDatabase>))
        .route("/prize/{id}/remaining", web::put().to(routes::set_remaining::<SqliteDatabase>))
        .route("/draw", web::post().to(routes::draw::<SqliteDatabase>))
        .route("/wins", web::get().to(routes::wins::<SqliteDatabase>))
        .route("/wins/by-user/{user_id}", web::get().to(routes::wins_by_user::<SqliteDatabase>))
        .route("/wins/count", web::get().to(routes::wins_count::<SqliteDatabase>))
        .route("/voucher-messages", web::post().to(routes::record_message::<SqliteDatabase>))
        .route("/voucher-messages", web::get().to(routes::list_messages::<SqliteDatabase>))
        .route("/voucher-messages/{id}", web::delete().to(routes::delete_message::<SqliteDatabase>))
        .route("/tracks", web::get().to(routes::list_tracks::<SqliteDatabase>))
        .route("/tracks", web::post().to(routes::add_track::<SqliteDatabase>))
        .route("/player/{op}", web::post().to(routes::player_op))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    hub: PlayerHub<WsSink>,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let ledger_api = LedgerApi::new(db.clone(), producers.clone());
        let draw_api = DrawApi::new(db.clone(), producers.clone());
        let message_api = MessageApi::new(db.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("ppg::access_log"))
            .app_data(web::Data::new(ledger_api))
            .app_data(web::Data::new(draw_api))
            .app_data(web::Data::new(message_api))
            .app_data(web::Data::new(db.clone()))
            .app_data(web::Data::new(hub.clone()));
        // The open routes must be registered ahead of the catch-all admin scope.
        app.service(routes::health)
            .route("/ws/player", web::get().to(player_ws::<SqliteDatabase>))
            .service(api_scope(&config.api_token))
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
