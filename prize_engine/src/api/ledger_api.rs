use std::fmt::Debug;

use log::*;

use crate::{
    db::traits::{LedgerDatabase, LedgerError, TotalGamesAdjustment, VoucherQueryFilter},
    db_types::{NewVoucher, Voucher},
    events::{EventProducers, VoucherIssuedEvent},
};

/// `LedgerApi` is the primary API for the voucher lifecycle: issuing codes, consuming games and
/// adjusting capacity.
pub struct LedgerApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for LedgerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LedgerApi")
    }
}

impl<B> LedgerApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> LedgerApi<B>
where B: LedgerDatabase
{
    /// Issue a voucher to a user, recycling an existing row when one is available.
    ///
    /// Subscribers of the voucher-issued hook are notified after the database write succeeds.
    pub async fn issue_voucher(&self, voucher: NewVoucher) -> Result<Voucher, LedgerError> {
        let user_id = voucher.user_id;
        let voucher = self.db.issue_or_reuse(voucher).await?;
        debug!("🎟️ Voucher [{}] issued to user {user_id}", voucher.code);
        self.call_voucher_issued_hook(&voucher).await;
        Ok(voucher)
    }

    async fn call_voucher_issued_hook(&self, voucher: &Voucher) {
        for emitter in &self.producers.voucher_issued_producer {
            trace!("🎟️ Notifying voucher issued hook subscribers");
            let event = VoucherIssuedEvent::new(voucher.clone());
            emitter.publish_event(event).await;
        }
    }

    /// Consume one game from a voucher. Fails with [`LedgerError::NoRemainingGames`] once
    /// capacity is spent, no matter how many callers race.
    pub async fn play_game(&self, voucher_id: i64) -> Result<Voucher, LedgerError> {
        self.db.play_game(voucher_id).await
    }

    /// Legacy code-keyed variant of [`Self::play_game`].
    pub async fn redeem_by_code(&self, code: &str) -> Result<Voucher, LedgerError> {
        self.db.redeem_by_code(code).await
    }

    pub async fn adjust_total_games(
        &self,
        voucher_id: i64,
        adjustment: TotalGamesAdjustment,
    ) -> Result<Voucher, LedgerError> {
        self.db.adjust_total_games(voucher_id, adjustment).await
    }

    pub async fn voucher_by_id(&self, id: i64) -> Result<Option<Voucher>, LedgerError> {
        self.db.fetch_voucher_by_id(id).await
    }

    pub async fn voucher_by_code(&self, code: &str) -> Result<Option<Voucher>, LedgerError> {
        self.db.fetch_voucher_by_code(code).await
    }

    pub async fn search_vouchers(&self, query: VoucherQueryFilter) -> Result<Vec<Voucher>, LedgerError> {
        self.db.search_vouchers(query).await
    }
}
