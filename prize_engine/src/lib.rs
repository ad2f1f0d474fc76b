//! Prize Engine
//!
//! The prize engine is the backend for a party prize gateway: admins hand out voucher codes that
//! grant a bounded number of slot-machine games, players spend those games on prize draws, and a
//! background worker keeps chat notifications in sync with voucher state.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@db`]). SQLite is the supported backend. You should
//!    never need to access the database directly; use the public API instead. The exception is the
//!    data types used in the database, which are defined in the `db_types` module and are public.
//! 2. The engine public API ([`mod@api`]). [`LedgerApi`] owns the voucher lifecycle
//!    (issue/reuse/play), [`DrawApi`] owns prize inventory, draws and the win log, and
//!    [`MessageApi`] owns the delivery-tracking records used by the reconciliation worker.
//!    Backends implement the traits in [`mod@db`] to plug into these APIs.
//!
//! The engine also provides a set of events that can be subscribed to. For example, when a prize
//! draw succeeds, a `PrizeWonEvent` is emitted; the gateway server uses this to push win
//! notifications to live WebSocket subscribers.
mod api;
mod db;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub mod db_types;
pub mod events;
pub mod helpers;

pub use api::{DrawApi, LedgerApi, MessageApi};
#[cfg(feature = "sqlite")]
pub use db::sqlite::SqliteDatabase;
pub use db::traits::{
    LedgerDatabase,
    LedgerError,
    LedgerQueries,
    MessageQueryFilter,
    MessageTracking,
    TotalGamesAdjustment,
    VoucherQueryFilter,
};
