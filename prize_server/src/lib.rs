//! # Party prize gateway server
//! This module hosts the HTTP and WebSocket front end for the prize engine. It is responsible
//! for:
//! * Serving the admin API for vouchers, prizes, draws and the win log.
//! * Serving the party player WebSocket channel and fanning out state and prize-win events.
//! * Running the voucher delivery and reconciliation worker against the chat backend.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more
//! information.
pub mod config;
pub mod data_objects;
pub mod delivery;
pub mod errors;
pub mod middleware;
pub mod player;
pub mod routes;
pub mod server;
pub mod sync_worker;

#[cfg(test)]
mod endpoint_tests;
