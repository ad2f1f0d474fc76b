//! WebSocket transport for the party player channel.
use actix_web::{web, HttpRequest, HttpResponse};
use actix_ws::{Message, Session};
use async_trait::async_trait;
use futures::StreamExt;
use log::*;
use prize_engine::LedgerQueries;

use super::{HubRequest, PlayerHub, PlayerSink, SinkClosed};

/// A [`PlayerSink`] backed by a live WebSocket session.
#[derive(Clone)]
pub struct WsSink(Session);

#[async_trait]
impl PlayerSink for WsSink {
    async fn send(&mut self, text: String) -> Result<(), SinkClosed> {
        self.0.text(text).await.map_err(|_| SinkClosed)
    }
}

/// `GET /ws/player`. Upgrades the connection and pumps client messages into the hub until the
/// socket closes. A `refresh_playlist` op is resolved here since it needs a database round trip.
pub async fn player_ws<B: LedgerQueries + 'static>(
    req: HttpRequest,
    stream: web::Payload,
    hub: web::Data<PlayerHub<WsSink>>,
    db: web::Data<B>,
) -> Result<HttpResponse, actix_web::Error> {
    let (response, mut session, mut msg_stream) = actix_ws::handle(&req, stream)?;
    let hub = hub.into_inner();
    let db = db.into_inner();
    actix_web::rt::spawn(async move {
        // Reload the playlist so the connect snapshot is never stale.
        match db.fetch_tracks().await {
            Ok(tracks) => hub.set_playlist(tracks).await,
            Err(e) => warn!("💻 Could not load the playlist for a new client: {e}"),
        }
        let id = hub.connect(WsSink(session.clone())).await;
        while let Some(Ok(msg)) = msg_stream.next().await {
            match msg {
                Message::Text(text) => {
                    if let Some(HubRequest::RefreshPlaylist) = hub.handle_message(id, &text).await {
                        match db.fetch_tracks().await {
                            Ok(tracks) => hub.set_playlist(tracks).await,
                            Err(e) => warn!("💻 Could not refresh the playlist: {e}"),
                        }
                    }
                },
                Message::Ping(bytes) => {
                    if session.pong(&bytes).await.is_err() {
                        break;
                    }
                },
                Message::Close(_) => break,
                _ => {},
            }
        }
        hub.disconnect(id).await;
        let _ = session.close(None).await;
    });
    Ok(response)
}
