//! The public API of the prize engine.
//!
//! Each API struct is a thin wrapper around a database backend that adds logging and event
//! publication on top of the backend's transactional guarantees.
mod draw_api;
mod ledger_api;
mod message_api;

pub use draw_api::DrawApi;
pub use ledger_api::LedgerApi;
pub use message_api::MessageApi;
