//! The shared party-player channel.
//!
//! One [`PlayerHub`] instance lives for the lifetime of the server. Every WebSocket client
//! registers a sink with it; player commands mutate the shared state and the resulting state is
//! fanned out to every registered sink. Sinks that fail to accept a message are evicted on the
//! spot, so a dead client can never wedge the channel.
//!
//! The hub is generic over [`PlayerSink`] so the whole command protocol can be tested without a
//! network.
mod ws;

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use log::*;
use prize_engine::db_types::Track;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;

pub use ws::{player_ws, WsSink};

/// The receiving end of one connected client.
#[async_trait]
pub trait PlayerSink: Send + 'static {
    async fn send(&mut self, text: String) -> Result<(), SinkClosed>;
}

#[derive(Debug)]
pub struct SinkClosed;

/// A command the hub cannot resolve on its own and hands back to the transport layer.
#[derive(Debug, PartialEq, Eq)]
pub enum HubRequest {
    RefreshPlaylist,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PlayerState {
    pub playing: bool,
    pub index: usize,
    pub track_count: usize,
    pub current: Option<Track>,
}

struct HubInner<S> {
    next_id: u64,
    sessions: HashMap<u64, S>,
    playing: bool,
    index: usize,
    playlist: Vec<Track>,
}

impl<S> HubInner<S> {
    fn state(&self) -> PlayerState {
        PlayerState {
            playing: self.playing,
            index: self.index,
            track_count: self.playlist.len(),
            current: self.playlist.get(self.index).cloned(),
        }
    }
}

pub struct PlayerHub<S: PlayerSink> {
    inner: Arc<Mutex<HubInner<S>>>,
}

impl<S: PlayerSink> Clone for PlayerHub<S> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<S: PlayerSink> Default for PlayerHub<S> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<S: PlayerSink> PlayerHub<S> {
    pub fn new(playlist: Vec<Track>) -> Self {
        let inner = HubInner { next_id: 0, sessions: HashMap::new(), playing: false, index: 0, playlist };
        Self { inner: Arc::new(Mutex::new(inner)) }
    }

    /// Registers a client sink and sends it the current state.
    pub async fn connect(&self, mut sink: S) -> u64 {
        let mut inner = self.inner.lock().await;
        let id = inner.next_id;
        inner.next_id += 1;
        let hello = state_message(&inner.state()).to_string();
        if sink.send(hello).await.is_ok() {
            inner.sessions.insert(id, sink);
            debug!("💻 Player client #{id} connected ({} online)", inner.sessions.len());
        }
        id
    }

    pub async fn disconnect(&self, id: u64) {
        let mut inner = self.inner.lock().await;
        if inner.sessions.remove(&id).is_some() {
            debug!("💻 Player client #{id} disconnected ({} online)", inner.sessions.len());
        }
    }

    pub async fn session_count(&self) -> usize {
        self.inner.lock().await.sessions.len()
    }

    pub async fn state(&self) -> PlayerState {
        self.inner.lock().await.state()
    }

    pub async fn playlist(&self) -> Vec<Track> {
        self.inner.lock().await.playlist.clone()
    }

    /// Replaces the playlist and broadcasts it. The current index is clamped into the new list.
    pub async fn set_playlist(&self, tracks: Vec<Track>) {
        let message = {
            let mut inner = self.inner.lock().await;
            inner.playlist = tracks;
            if inner.index >= inner.playlist.len() {
                inner.index = 0;
            }
            playlist_message(&inner.playlist).to_string()
        };
        self.broadcast(message).await;
    }

    /// Pushes an arbitrary event (e.g. a prize win) to every connected client.
    pub async fn broadcast_event(&self, event: Value) {
        self.broadcast(event.to_string()).await;
    }

    /// Handles one raw client message. Replies and broadcasts go out through the registered
    /// sinks; a request the hub cannot satisfy alone is returned to the caller.
    pub async fn handle_message(&self, session_id: u64, raw: &str) -> Option<HubRequest> {
        match parse_op(raw) {
            Ok(op) => self.apply(session_id, op).await,
            Err(message) => {
                self.reply(session_id, error_message(&message).to_string()).await;
                None
            },
        }
    }

    async fn apply(&self, session_id: u64, op: PlayerOp) -> Option<HubRequest> {
        match op {
            PlayerOp::Ping => self.reply(session_id, json!({ "type": "pong" }).to_string()).await,
            PlayerOp::GetState => {
                let state = self.state().await;
                self.reply(session_id, state_message(&state).to_string()).await;
            },
            PlayerOp::GetPlaylist => {
                let tracks = self.playlist().await;
                self.reply(session_id, playlist_message(&tracks).to_string()).await;
            },
            PlayerOp::RefreshPlaylist => return Some(HubRequest::RefreshPlaylist),
            op => {
                if let Err(message) = self.apply_op(op).await {
                    self.reply(session_id, error_message(&message).to_string()).await;
                }
            },
        }
        None
    }

    /// Applies a state-changing command and broadcasts the new state. This is the entry point
    /// shared by the WebSocket protocol and the HTTP player endpoints. Query ops (`ping`,
    /// `get_state`, `get_playlist`, `refresh_playlist`) are not accepted here.
    pub async fn apply_op(&self, op: PlayerOp) -> Result<PlayerState, String> {
        let state = {
            let mut inner = self.inner.lock().await;
            match op {
                PlayerOp::Play { index } => {
                    if let Some(index) = index {
                        if index >= inner.playlist.len() {
                            return Err("Index out of range".to_string());
                        }
                        inner.index = index;
                    }
                    inner.playing = true;
                },
                PlayerOp::Pause => inner.playing = false,
                PlayerOp::Next => {
                    if !inner.playlist.is_empty() {
                        inner.index = (inner.index + 1) % inner.playlist.len();
                    }
                },
                PlayerOp::Prev => {
                    if !inner.playlist.is_empty() {
                        let len = inner.playlist.len();
                        inner.index = (inner.index + len - 1) % len;
                    }
                },
                PlayerOp::Seek { index } => {
                    if index >= inner.playlist.len() {
                        return Err("Index out of range".to_string());
                    }
                    inner.index = index;
                },
                PlayerOp::Shuffle => {
                    {
                        let mut rng = rand::thread_rng();
                        use rand::seq::SliceRandom;
                        inner.playlist.shuffle(&mut rng);
                    }
                    inner.index = 0;
                },
                _ => return Err(format!("Not a player command: {op:?}")),
            }
            inner.state()
        };
        self.broadcast(state_message(&state).to_string()).await;
        Ok(state)
    }

    async fn reply(&self, session_id: u64, message: String) {
        let mut inner = self.inner.lock().await;
        if let Some(sink) = inner.sessions.get_mut(&session_id) {
            if sink.send(message).await.is_err() {
                inner.sessions.remove(&session_id);
                debug!("💻 Player client #{session_id} evicted on failed reply");
            }
        }
    }

    async fn broadcast(&self, message: String) {
        let mut inner = self.inner.lock().await;
        let mut dead = Vec::new();
        for (id, sink) in inner.sessions.iter_mut() {
            if sink.send(message.clone()).await.is_err() {
                dead.push(*id);
            }
        }
        for id in dead {
            inner.sessions.remove(&id);
            debug!("💻 Player client #{id} evicted on failed broadcast");
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerOp {
    Play { index: Option<usize> },
    Pause,
    Next,
    Prev,
    Seek { index: usize },
    Shuffle,
    Ping,
    GetState,
    GetPlaylist,
    RefreshPlaylist,
}

fn state_message(state: &PlayerState) -> Value {
    json!({ "type": "state", "state": state })
}

fn playlist_message(tracks: &[Track]) -> Value {
    json!({ "type": "playlist", "tracks": tracks })
}

fn error_message(message: &str) -> Value {
    json!({ "type": "error", "message": message })
}

/// Parses a raw client message into a [`PlayerOp`].
pub fn parse_op(raw: &str) -> Result<PlayerOp, String> {
    let value: Value = serde_json::from_str(raw).map_err(|_| "Missing op".to_string())?;
    let op = value.get("op").and_then(Value::as_str).ok_or_else(|| "Missing op".to_string())?;
    let index = |required: bool| -> Result<Option<usize>, String> {
        match value.get("index") {
            None | Some(Value::Null) if !required => Ok(None),
            None | Some(Value::Null) => Err("Invalid index".to_string()),
            Some(v) => v.as_u64().map(|i| Some(i as usize)).ok_or_else(|| "Invalid index".to_string()),
        }
    };
    match op {
        "play" => Ok(PlayerOp::Play { index: index(false)? }),
        "pause" => Ok(PlayerOp::Pause),
        "next" => Ok(PlayerOp::Next),
        "prev" => Ok(PlayerOp::Prev),
        "seek" => {
            let index = index(true)?.unwrap_or_default();
            Ok(PlayerOp::Seek { index })
        },
        "shuffle" => Ok(PlayerOp::Shuffle),
        "ping" => Ok(PlayerOp::Ping),
        "get_state" => Ok(PlayerOp::GetState),
        "get_playlist" => Ok(PlayerOp::GetPlaylist),
        "refresh_playlist" => Ok(PlayerOp::RefreshPlaylist),
        other => Err(format!("Unknown op: {other}")),
    }
}
