//! `SqliteDatabase` is a concrete implementation of a prize engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the
//! [`crate::db::traits`] module.
use std::fmt::Debug;

use chrono::Utc;
use log::*;
use sqlx::{Connection, SqliteConnection, SqlitePool};

use super::db::{db_url, new_pool, prizes, tracks, voucher_messages, vouchers};
use crate::{
    db::traits::{
        LedgerDatabase,
        LedgerError,
        LedgerQueries,
        MessageQueryFilter,
        MessageTracking,
        TotalGamesAdjustment,
        VoucherQueryFilter,
    },
    db_types::{
        DrawResult,
        NewPrize,
        NewTrack,
        NewVoucher,
        NewVoucherMessage,
        Prize,
        PrizeListing,
        PrizeWinRecord,
        Track,
        Voucher,
        VoucherMessage,
    },
    helpers::{generate_code, is_valid_prize_name, weighted_choice},
};

/// Collision retry budget for minting fresh voucher codes. The code space holds 10,000 codes, so
/// running out of attempts means the space itself is (nearly) full.
const MAX_CODE_ATTEMPTS: usize = 10_000;

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl LedgerDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn issue_or_reuse(&self, voucher: NewVoucher) -> Result<Voucher, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        if let Some(v) = vouchers::reassign_released(&voucher, &mut conn).await? {
            debug!("🎟️ Reassigned released voucher [{}] to user {}", v.code, voucher.user_id);
            return Ok(v);
        }
        if let Some(v) = vouchers::recycle_exhausted(&voucher, &mut conn).await? {
            debug!("🎟️ Recycled exhausted voucher [{}] for user {}", v.code, voucher.user_id);
            return Ok(v);
        }
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = {
                let mut rng = rand::thread_rng();
                generate_code(&mut rng)
            };
            match vouchers::insert_voucher(&voucher, &code, &mut conn).await {
                Ok(v) => {
                    debug!("🎟️ Minted fresh voucher [{}] for user {}", v.code, voucher.user_id);
                    return Ok(v);
                },
                Err(sqlx::Error::Database(de)) if de.is_unique_violation() => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(LedgerError::CodeSpaceExhausted)
    }

    async fn play_game(&self, voucher_id: i64) -> Result<Voucher, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        match vouchers::consume_game_by_id(voucher_id, &mut conn).await? {
            Some(v) => {
                debug!("🎟️ Voucher [{}] played. {} game(s) left", v.code, v.remaining_games());
                Ok(v)
            },
            // The CAS lost. Distinguish a missing voucher from an exhausted one.
            None => match vouchers::fetch_voucher_by_id(voucher_id, &mut conn).await? {
                Some(_) => Err(LedgerError::NoRemainingGames),
                None => Err(LedgerError::VoucherIdNotFound(voucher_id)),
            },
        }
    }

    async fn redeem_by_code(&self, code: &str) -> Result<Voucher, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        match vouchers::consume_game_by_code(code, &mut conn).await? {
            Some(v) => Ok(v),
            None => match vouchers::fetch_voucher_by_code(code, &mut conn).await? {
                Some(_) => Err(LedgerError::NoRemainingGames),
                None => Err(LedgerError::VoucherNotFound(code.to_string())),
            },
        }
    }

    async fn adjust_total_games(
        &self,
        voucher_id: i64,
        adjustment: TotalGamesAdjustment,
    ) -> Result<Voucher, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let voucher = vouchers::adjust_total_games(voucher_id, adjustment, &mut conn).await?;
        debug!("🎟️ Voucher [{}] capacity adjusted to {} games", voucher.code, voucher.total_games);
        Ok(voucher)
    }

    async fn draw_prize(&self, code: &str) -> Result<DrawResult, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        // An IMMEDIATE transaction takes the write lock up front, so the read-then-decrement
        // sequence below cannot interleave with a competing draw.
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;
        match draw_prize_in_tx(code, &mut conn).await {
            Ok(draw) => {
                if let Err(e) = sqlx::query("COMMIT").execute(&mut *conn).await {
                    // The transaction state is unknown; the connection may not rejoin the pool.
                    warn!("🎁 Commit failed for draw with voucher [{code}]: {e}. Closing the connection");
                    let _ = conn.detach().close().await;
                    return Err(e.into());
                }
                info!("🎁 User {} won [{}] with voucher [{code}]", draw.user_id, draw.prize.name);
                Ok(draw)
            },
            Err(e) => {
                debug!("🎁 Draw with voucher [{code}] rolled back: {e}");
                if let Err(re) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
                    warn!("🎁 Rollback failed for draw with voucher [{code}]: {re}. Closing the connection");
                    let _ = conn.detach().close().await;
                }
                Err(e)
            },
        }
    }

    async fn create_prize(&self, prize: NewPrize) -> Result<Prize, LedgerError> {
        if !is_valid_prize_name(&prize.name) {
            return Err(LedgerError::InvalidPrizeName(prize.name));
        }
        let mut tx = self.pool.begin().await?;
        let created = prizes::insert_prize(&prize, &mut tx).await?;
        if let Some(remaining) = prize.remaining.filter(|r| *r > 0) {
            prizes::upsert_remaining(created.id, remaining, &mut tx).await?;
        }
        tx.commit().await?;
        info!("🎁 Prize [{}] created with weight {}", created.name, created.weight);
        Ok(created)
    }

    async fn set_prize_remaining(&self, prize_id: i64, remaining: i64) -> Result<(), LedgerError> {
        let mut conn = self.pool.acquire().await?;
        if !prizes::prize_exists(prize_id, &mut conn).await? {
            return Err(LedgerError::PrizeNotFound(prize_id));
        }
        if remaining > 0 {
            prizes::upsert_remaining(prize_id, remaining, &mut conn).await?;
        } else {
            prizes::delete_remaining(prize_id, &mut conn).await?;
        }
        debug!("🎁 Prize {prize_id} inventory set to {remaining}");
        Ok(())
    }

    async fn insert_track(&self, track: NewTrack) -> Result<Track, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let track = tracks::insert_track(&track, &mut conn).await?;
        Ok(track)
    }
}

/// The body of a prize draw. Must run inside a write transaction; every error path rolls the
/// voucher decrement back along with everything else.
async fn draw_prize_in_tx(code: &str, conn: &mut SqliteConnection) -> Result<DrawResult, LedgerError> {
    let voucher = vouchers::fetch_voucher_by_code(code, conn)
        .await?
        .ok_or_else(|| LedgerError::VoucherNotFound(code.to_string()))?;
    let user_id = voucher.user_id.ok_or_else(|| LedgerError::VoucherUnassigned(code.to_string()))?;
    let voucher = vouchers::consume_game_by_code(code, conn).await?.ok_or(LedgerError::NoRemainingGames)?;
    let candidates = prizes::draw_candidates(conn).await?;
    if candidates.is_empty() {
        return Err(LedgerError::NoPrizesAvailable);
    }
    let weights = candidates.iter().map(|c| c.weight * c.remaining as f64).collect::<Vec<f64>>();
    let idx = {
        let mut rng = rand::thread_rng();
        weighted_choice(&weights, &mut rng)
    }
    .ok_or(LedgerError::NoPrizesAvailable)?;
    let candidate = &candidates[idx];
    let left = prizes::decrement_remaining(candidate.id, conn).await?.ok_or(LedgerError::PrizeJustRanOut)?;
    if left == 0 {
        prizes::delete_remaining(candidate.id, conn).await?;
    }
    let won_at = Utc::now();
    let win_id = prizes::insert_win(user_id, candidate.id, won_at, conn).await?;
    Ok(DrawResult { win_id, user_id, prize: candidate.prize(), won_at, voucher })
}

impl LedgerQueries for SqliteDatabase {
    async fn fetch_voucher_by_id(&self, id: i64) -> Result<Option<Voucher>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let voucher = vouchers::fetch_voucher_by_id(id, &mut conn).await?;
        Ok(voucher)
    }

    async fn fetch_voucher_by_code(&self, code: &str) -> Result<Option<Voucher>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let voucher = vouchers::fetch_voucher_by_code(code, &mut conn).await?;
        Ok(voucher)
    }

    async fn search_vouchers(&self, query: VoucherQueryFilter) -> Result<Vec<Voucher>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let vouchers = vouchers::search_vouchers(query, &mut conn).await?;
        Ok(vouchers)
    }

    async fn fetch_wins(
        &self,
        user_id: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PrizeWinRecord>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let wins = prizes::fetch_wins(user_id, limit, offset, &mut conn).await?;
        Ok(wins)
    }

    async fn count_wins(&self, user_id: Option<i64>) -> Result<i64, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let count = prizes::count_wins(user_id, &mut conn).await?;
        Ok(count)
    }

    async fn fetch_prizes(&self) -> Result<Vec<PrizeListing>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let prizes = prizes::fetch_prizes(&mut conn).await?;
        Ok(prizes)
    }

    async fn fetch_remaining(&self, prize_id: i64) -> Result<Option<i64>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let remaining = prizes::fetch_remaining(prize_id, &mut conn).await?;
        Ok(remaining)
    }

    async fn fetch_tracks(&self) -> Result<Vec<Track>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let tracks = tracks::fetch_tracks(&mut conn).await?;
        Ok(tracks)
    }
}

impl MessageTracking for SqliteDatabase {
    async fn record_message(&self, msg: NewVoucherMessage) -> Result<VoucherMessage, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let record = voucher_messages::insert_message(&msg, &mut conn).await?;
        debug!("📬 Message {} for voucher [{}] recorded", record.message_id, record.voucher_code);
        Ok(record)
    }

    async fn search_messages(&self, query: MessageQueryFilter) -> Result<Vec<VoucherMessage>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let records = voucher_messages::search_messages(query, &mut conn).await?;
        Ok(records)
    }

    async fn mark_message_deleted(&self, id: i64) -> Result<VoucherMessage, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let record = voucher_messages::mark_deleted(id, &mut conn).await?;
        Ok(record)
    }

    async fn active_message_exists(&self, user_id: i64, code: &str) -> Result<bool, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let exists = voucher_messages::active_exists(user_id, code, &mut conn).await?;
        Ok(exists)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
