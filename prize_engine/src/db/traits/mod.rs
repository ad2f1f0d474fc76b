//! # Database management and control.
//!
//! This module defines the interface contracts that database backends must expose in order to
//! support the prize engine.
//!
//! * [`LedgerDatabase`] is the highest level of behaviour: voucher issue/reuse, atomic game
//!   consumption, prize draws and inventory administration. All mutations on a single voucher are
//!   linearizable — implementations must use guarded single-statement updates or explicit
//!   transactions so that two concurrent plays can never both consume the last unit of capacity.
//! * [`LedgerQueries`] provides read-only access to vouchers, prizes, the win log and the
//!   playlist.
//! * [`MessageTracking`] owns the `voucher_messages` delivery-tracking records consumed by the
//!   reconciliation worker.
mod ledger_database;
mod ledger_queries;
mod message_tracking;

pub use ledger_database::{LedgerDatabase, LedgerError, TotalGamesAdjustment};
pub use ledger_queries::{LedgerQueries, VoucherQueryFilter};
pub use message_tracking::{MessageQueryFilter, MessageTracking};
