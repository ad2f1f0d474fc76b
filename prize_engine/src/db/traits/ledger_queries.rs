use std::future::Future;

use crate::{
    db::traits::LedgerError,
    db_types::{PrizeListing, PrizeWinRecord, Track, Voucher},
};

/// A filter for searching vouchers. Every populated field narrows the result set; an empty filter
/// returns all vouchers.
#[derive(Debug, Clone, Default)]
pub struct VoucherQueryFilter {
    pub user_id: Option<i64>,
    pub code: Option<String>,
    /// `Some(true)` keeps only exhausted vouchers, `Some(false)` keeps only vouchers with games
    /// remaining.
    pub exhausted: Option<bool>,
}

impl VoucherQueryFilter {
    pub fn for_user(user_id: i64) -> Self {
        Self { user_id: Some(user_id), ..Default::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() && self.code.is_none() && self.exhausted.is_none()
    }
}

/// Read-only access to vouchers, prizes, the win log and the playlist.
#[allow(async_fn_in_trait)]
pub trait LedgerQueries {
    async fn fetch_voucher_by_id(&self, id: i64) -> Result<Option<Voucher>, LedgerError>;

    fn fetch_voucher_by_code(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<Option<Voucher>, LedgerError>> + Send;

    /// Returns vouchers matching the filter, newest first.
    fn search_vouchers(
        &self,
        query: VoucherQueryFilter,
    ) -> impl Future<Output = Result<Vec<Voucher>, LedgerError>> + Send;

    /// Returns win-log entries, newest first, optionally restricted to one user.
    async fn fetch_wins(
        &self,
        user_id: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PrizeWinRecord>, LedgerError>;

    async fn count_wins(&self, user_id: Option<i64>) -> Result<i64, LedgerError>;

    /// Returns all prize definitions with their current inventory, including prizes that are out
    /// of the draw pool.
    async fn fetch_prizes(&self) -> Result<Vec<PrizeListing>, LedgerError>;

    /// Returns the remaining inventory for a prize, or `None` when the prize has no inventory row.
    async fn fetch_remaining(&self, prize_id: i64) -> Result<Option<i64>, LedgerError>;

    /// Returns the playlist in insertion order.
    async fn fetch_tracks(&self) -> Result<Vec<Track>, LedgerError>;
}
