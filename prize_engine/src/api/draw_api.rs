use std::fmt::Debug;

use log::*;

use crate::{
    db::traits::{LedgerDatabase, LedgerError},
    db_types::{DrawResult, NewPrize, Prize, PrizeListing, PrizeWinRecord},
    events::{EventProducers, PrizeWonEvent},
};

/// `DrawApi` owns the prize catalogue, inventory and the draw itself.
pub struct DrawApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for DrawApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DrawApi")
    }
}

impl<B> DrawApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> DrawApi<B>
where B: LedgerDatabase
{
    /// Run a prize draw against a voucher code.
    ///
    /// The draw is all-or-nothing: the voucher decrement, the inventory decrement and the win
    /// record commit together or not at all. Subscribers of the prize-won hook are notified after
    /// the commit.
    pub async fn draw(&self, code: &str) -> Result<DrawResult, LedgerError> {
        let result = self.db.draw_prize(code).await?;
        self.call_prize_won_hook(&result).await;
        Ok(result)
    }

    async fn call_prize_won_hook(&self, result: &DrawResult) {
        for emitter in &self.producers.prize_won_producer {
            trace!("🎁 Notifying prize won hook subscribers");
            let event = PrizeWonEvent::new(result.clone());
            emitter.publish_event(event).await;
        }
    }

    pub async fn create_prize(&self, prize: NewPrize) -> Result<Prize, LedgerError> {
        self.db.create_prize(prize).await
    }

    pub async fn set_remaining(&self, prize_id: i64, remaining: i64) -> Result<(), LedgerError> {
        self.db.set_prize_remaining(prize_id, remaining).await
    }

    pub async fn prizes(&self) -> Result<Vec<PrizeListing>, LedgerError> {
        self.db.fetch_prizes().await
    }

    pub async fn remaining(&self, prize_id: i64) -> Result<Option<i64>, LedgerError> {
        self.db.fetch_remaining(prize_id).await
    }

    /// Returns a page of the win log, newest first.
    pub async fn wins(
        &self,
        user_id: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PrizeWinRecord>, LedgerError> {
        self.db.fetch_wins(user_id, limit, offset).await
    }

    pub async fn count_wins(&self, user_id: Option<i64>) -> Result<i64, LedgerError> {
        self.db.count_wins(user_id).await
    }
}
