use std::future::Future;

use crate::{
    db::traits::LedgerError,
    db_types::{NewVoucherMessage, VoucherMessage},
};

/// A filter for searching delivery-tracking records.
#[derive(Debug, Clone, Default)]
pub struct MessageQueryFilter {
    pub user_id: Option<i64>,
    pub voucher_code: Option<String>,
    /// `Some(true)` keeps only soft-deleted records, `Some(false)` keeps only active ones.
    pub deleted: Option<bool>,
}

impl MessageQueryFilter {
    pub fn active() -> Self {
        Self { deleted: Some(false), ..Default::default() }
    }
}

/// Owns the `voucher_messages` table: one row per voucher notification delivered to a chat.
///
/// Records are never hard-deleted. The reconciliation worker marks a record deleted once the
/// voucher it advertises is exhausted or gone, and the retraction of the external message is
/// best-effort on top of that.
#[allow(async_fn_in_trait)]
pub trait MessageTracking: Clone {
    /// Record that a voucher notification was delivered.
    fn record_message(
        &self,
        msg: NewVoucherMessage,
    ) -> impl Future<Output = Result<VoucherMessage, LedgerError>> + Send;

    /// Returns tracking records matching the filter, oldest first.
    fn search_messages(
        &self,
        query: MessageQueryFilter,
    ) -> impl Future<Output = Result<Vec<VoucherMessage>, LedgerError>> + Send;

    /// Soft-delete a tracking record. Idempotent: marking an already-deleted record keeps the
    /// original `deleted_at` timestamp.
    fn mark_message_deleted(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<VoucherMessage, LedgerError>> + Send;

    /// True when the user already has an active (non-deleted) notification for this voucher code.
    /// The delivery pass uses this to stay idempotent across worker restarts.
    fn active_message_exists(
        &self,
        user_id: i64,
        code: &str,
    ) -> impl Future<Output = Result<bool, LedgerError>> + Send;
}
