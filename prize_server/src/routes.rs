//! Request handlers for the admin API.
//!
//! Handlers are generic over the backend so that they bind to whatever [`LedgerDatabase`]
//! implementation the server was built with. They are registered in
//! [server::create_server_instance](crate::server::create_server_instance); every route except
//! `GET /health` and the player WebSocket sits behind the bearer-token middleware.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use prize_engine::{
    db_types::{NewPrize, NewTrack, NewVoucher, NewVoucherMessage},
    DrawApi,
    LedgerApi,
    LedgerDatabase,
    MessageApi,
    MessageQueryFilter,
    MessageTracking,
    VoucherQueryFilter,
};

use crate::{
    data_objects::{
        AdjustGamesParams,
        DrawRequest,
        IssueVoucherRequest,
        JsonResponse,
        MessagesQuery,
        NewMessageRequest,
        NewPrizeRequest,
        NewTrackRequest,
        PageQuery,
        RedeemRequest,
        SetRemainingRequest,
        VoucherSearchQuery,
        WinCount,
        WinCountQuery,
    },
    errors::ServerError,
    player::{PlayerHub, PlayerOp, WsSink},
};

/// Route handler for the health check endpoint
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻 Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//--------------------------------------     Vouchers       ----------------------------------------------------------

/// `POST /voucher`. Issues a voucher, recycling a released or exhausted row if possible.
pub async fn issue_voucher<B: LedgerDatabase>(
    api: web::Data<LedgerApi<B>>,
    body: web::Json<IssueVoucherRequest>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    debug!("💻 POST /voucher for user {}", req.user_id);
    let voucher = api
        .issue_voucher(NewVoucher {
            user_id: req.user_id,
            issued_by: req.issued_by,
            total_games: req.total_games,
        })
        .await?;
    Ok(HttpResponse::Created().json(voucher))
}

/// `GET /voucher`. Search the ledger, newest first.
pub async fn search_vouchers<B: LedgerDatabase>(
    api: web::Data<LedgerApi<B>>,
    query: web::Query<VoucherSearchQuery>,
) -> Result<HttpResponse, ServerError> {
    let q = query.into_inner();
    // `active_only=false` means "everything", not "only exhausted".
    let filter = VoucherQueryFilter {
        user_id: q.user_id,
        code: q.code,
        exhausted: matches!(q.active_only, Some(true)).then_some(false),
    };
    let vouchers = api.search_vouchers(filter).await?;
    let page =
        vouchers.into_iter().skip(q.offset).take(q.limit.unwrap_or(usize::MAX)).collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(page))
}

/// `GET /voucher/code/{code}`. An exhausted voucher answers 410 so that clients can tell a spent
/// code apart from one that never existed.
pub async fn voucher_by_code<B: LedgerDatabase>(
    api: web::Data<LedgerApi<B>>,
    path: web::Path<String>,
) -> Result<HttpResponse, ServerError> {
    let code = path.into_inner();
    let voucher = api
        .voucher_by_code(&code)
        .await?
        .ok_or_else(|| ServerError::NotFound(format!("The voucher with code [{code}] does not exist")))?;
    if voucher.is_exhausted() {
        return Err(ServerError::Gone(format!("The voucher [{code}] has no remaining games")));
    }
    Ok(HttpResponse::Ok().json(voucher))
}

/// `PUT /voucher/{id}/play`. Consumes one game.
pub async fn play_game<B: LedgerDatabase>(
    api: web::Data<LedgerApi<B>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻 PUT /voucher/{id}/play");
    let voucher = api.play_game(id).await?;
    Ok(HttpResponse::Ok().json(voucher))
}

/// `PUT /voucher/{id}/count?add=|decrease=|set=`. Adjusts voucher capacity.
pub async fn adjust_games<B: LedgerDatabase>(
    api: web::Data<LedgerApi<B>>,
    path: web::Path<i64>,
    query: web::Query<AdjustGamesParams>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let adjustment = query.into_inner().into_adjustment()?;
    debug!("💻 PUT /voucher/{id}/count: {adjustment:?}");
    let voucher = api.adjust_total_games(id, adjustment).await?;
    Ok(HttpResponse::Ok().json(voucher))
}

/// `POST /voucher/used`. Deprecated redeem-by-code path; same contract as play.
pub async fn redeem<B: LedgerDatabase>(
    api: web::Data<LedgerApi<B>>,
    body: web::Json<RedeemRequest>,
) -> Result<HttpResponse, ServerError> {
    let code = body.into_inner().code;
    debug!("💻 POST /voucher/used [{code}]");
    let voucher = api.redeem_by_code(&code).await?;
    Ok(HttpResponse::Ok().json(voucher))
}

//--------------------------------------  Prizes and draws  ----------------------------------------------------------

/// `POST /prize`. Creates a prize definition, optionally seeding inventory.
pub async fn create_prize<B: LedgerDatabase>(
    api: web::Data<DrawApi<B>>,
    body: web::Json<NewPrizeRequest>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    debug!("💻 POST /prize: [{}]", req.name);
    let prize = api
        .create_prize(NewPrize {
            name: req.name,
            friendly_name: req.friendly_name,
            weight: req.weight,
            remaining: req.remaining,
        })
        .await?;
    Ok(HttpResponse::Created().json(prize))
}

/// `GET /prize`. Lists every prize with its inventory.
pub async fn list_prizes<B: LedgerDatabase>(api: web::Data<DrawApi<B>>) -> Result<HttpResponse, ServerError> {
    let prizes = api.prizes().await?;
    Ok(HttpResponse::Ok().json(prizes))
}

/// `PUT /prize/{id}/remaining`. Zero or less takes the prize out of the draw pool.
pub async fn set_remaining<B: LedgerDatabase>(
    api: web::Data<DrawApi<B>>,
    path: web::Path<i64>,
    body: web::Json<SetRemainingRequest>,
) -> Result<HttpResponse, ServerError> {
    let prize_id = path.into_inner();
    let remaining = body.into_inner().remaining;
    debug!("💻 PUT /prize/{prize_id}/remaining = {remaining}");
    api.set_remaining(prize_id, remaining).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Prize {prize_id} inventory set to {remaining}"))))
}

/// `POST /draw`. Consumes a game and runs the weighted draw in one transaction.
pub async fn draw<B: LedgerDatabase>(
    api: web::Data<DrawApi<B>>,
    body: web::Json<DrawRequest>,
) -> Result<HttpResponse, ServerError> {
    let code = body.into_inner().voucher;
    debug!("💻 POST /draw [{code}]");
    let result = api.draw(&code).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// `GET /wins`. A page of the win log, newest first.
pub async fn wins<B: LedgerDatabase>(
    api: web::Data<DrawApi<B>>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ServerError> {
    let q = query.into_inner();
    let wins = api.wins(None, q.limit, q.offset).await?;
    Ok(HttpResponse::Ok().json(wins))
}

/// `GET /wins/by-user/{user_id}`. One user's wins, newest first.
pub async fn wins_by_user<B: LedgerDatabase>(
    api: web::Data<DrawApi<B>>,
    path: web::Path<i64>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ServerError> {
    let user_id = path.into_inner();
    let q = query.into_inner();
    let wins = api.wins(Some(user_id), q.limit, q.offset).await?;
    Ok(HttpResponse::Ok().json(wins))
}

/// `GET /wins/count`. Total win count, optionally for one user.
pub async fn wins_count<B: LedgerDatabase>(
    api: web::Data<DrawApi<B>>,
    query: web::Query<WinCountQuery>,
) -> Result<HttpResponse, ServerError> {
    let total = api.count_wins(query.into_inner().user_id).await?;
    Ok(HttpResponse::Ok().json(WinCount { total }))
}

//--------------------------------------      Messages      ----------------------------------------------------------

/// `POST /voucher-messages`. Records an externally delivered voucher notification.
pub async fn record_message<B: MessageTracking>(
    api: web::Data<MessageApi<B>>,
    body: web::Json<NewMessageRequest>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    debug!("💻 POST /voucher-messages for voucher [{}]", req.voucher_code);
    let record = api
        .record_message(NewVoucherMessage {
            user_id: req.user_id,
            voucher_code: req.voucher_code,
            message_id: req.message_id,
        })
        .await?;
    Ok(HttpResponse::Created().json(record))
}

/// `GET /voucher-messages`. Lists delivery-tracking records, oldest first.
pub async fn list_messages<B: MessageTracking>(
    api: web::Data<MessageApi<B>>,
    query: web::Query<MessagesQuery>,
) -> Result<HttpResponse, ServerError> {
    let q = query.into_inner();
    // `active_only=false` means "everything", not "only deleted".
    let filter = MessageQueryFilter {
        user_id: q.user_id,
        voucher_code: q.voucher_code,
        deleted: matches!(q.active_only, Some(true)).then_some(false),
    };
    let messages = api.search_messages(filter).await?;
    Ok(HttpResponse::Ok().json(messages))
}

/// `DELETE /voucher-messages/{id}`. Soft-deletes the record. The chat message itself is retracted
/// by the next reconciliation pass.
pub async fn delete_message<B: MessageTracking>(
    api: web::Data<MessageApi<B>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻 DELETE /voucher-messages/{id}");
    api.mark_deleted(id).await?;
    Ok(HttpResponse::NoContent().finish())
}

//--------------------------------------      Playlist      ----------------------------------------------------------

/// `GET /tracks`. The playlist in insertion order, straight from the database.
pub async fn list_tracks<B: LedgerDatabase>(db: web::Data<B>) -> Result<HttpResponse, ServerError> {
    let tracks = db.fetch_tracks().await?;
    Ok(HttpResponse::Ok().json(tracks))
}

/// `POST /tracks`. Appends a track and pushes the refreshed playlist to live clients.
pub async fn add_track<B: LedgerDatabase>(
    db: web::Data<B>,
    hub: web::Data<PlayerHub<WsSink>>,
    body: web::Json<NewTrackRequest>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    debug!("💻 POST /tracks: [{}]", req.title);
    let track = db
        .insert_track(NewTrack { title: req.title, artist: req.artist, url: req.url, added_by: req.added_by })
        .await?;
    hub.set_playlist(db.fetch_tracks().await?).await;
    Ok(HttpResponse::Created().json(track))
}

//--------------------------------------       Player       ----------------------------------------------------------

/// `POST /player/{op}` for `play|pause|next|prev|shuffle`. Applies the command to the shared
/// player state and answers with the new state snapshot; live clients get the same snapshot as a
/// broadcast.
pub async fn player_op(
    hub: web::Data<PlayerHub<WsSink>>,
    path: web::Path<String>,
) -> Result<HttpResponse, ServerError> {
    let op = match path.into_inner().as_str() {
        "play" => PlayerOp::Play { index: None },
        "pause" => PlayerOp::Pause,
        "next" => PlayerOp::Next,
        "prev" => PlayerOp::Prev,
        "shuffle" => PlayerOp::Shuffle,
        other => return Err(ServerError::NotFound(format!("Unknown player op: {other}"))),
    };
    let state = hub.apply_op(op).await.map_err(ServerError::InvalidRequestBody)?;
    Ok(HttpResponse::Ok().json(state))
}
