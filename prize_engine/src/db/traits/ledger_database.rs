use thiserror::Error;

use crate::{
    db::traits::LedgerQueries,
    db_types::{DrawResult, NewPrize, NewTrack, NewVoucher, Prize, Track, Voucher},
};

/// How to modify a voucher's `total_games` capacity.
///
/// No floor at `use_count` is enforced: decreasing capacity below the current use count simply
/// makes the voucher read as exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotalGamesAdjustment {
    Add(i64),
    Decrease(i64),
    Set(i64),
}

/// This trait defines the highest level of behaviour for backends supporting the prize engine.
///
/// This behaviour includes:
/// * Issuing voucher codes, preferring to recycle released or exhausted rows over minting new
///   codes.
/// * Consuming voucher capacity atomically ("playing a game").
/// * Running the weighted prize draw as a single transaction over the voucher, the inventory and
///   the win log.
#[allow(async_fn_in_trait)]
pub trait LedgerDatabase: Clone + LedgerQueries {
    /// The URL of the database.
    fn url(&self) -> &str;

    /// Issue a voucher for a user, in priority order:
    /// 1. reassign the oldest released, non-exhausted voucher (`user_id IS NULL`),
    /// 2. recycle the oldest exhausted voucher,
    /// 3. mint a fresh row with a new random code, retrying on code collisions.
    ///
    /// Reassignment resets `use_count` to 0 and clears `used_at`. Returns
    /// [`LedgerError::CodeSpaceExhausted`] if the collision retry budget runs out, which signals a
    /// misconfigured code space rather than a transient condition.
    async fn issue_or_reuse(&self, voucher: NewVoucher) -> Result<Voucher, LedgerError>;

    /// Consume one game from the voucher with the given internal id.
    ///
    /// This is a single atomic compare-and-swap: the increment only happens while
    /// `use_count < total_games` still holds, so N concurrent plays against k units of remaining
    /// capacity yield exactly k successes.
    async fn play_game(&self, voucher_id: i64) -> Result<Voucher, LedgerError>;

    /// Deprecated convenience path: same contract as [`Self::play_game`], looked up by code.
    async fn redeem_by_code(&self, code: &str) -> Result<Voucher, LedgerError>;

    /// Admin operation: adjust the voucher's `total_games`.
    async fn adjust_total_games(
        &self,
        voucher_id: i64,
        adjustment: TotalGamesAdjustment,
    ) -> Result<Voucher, LedgerError>;

    /// Run a prize draw against the voucher with the given code.
    ///
    /// In a single transaction: consume one unit of voucher capacity, pick a prize by weighted
    /// random choice over the remaining inventory (weight × remaining, uniform fallback when the
    /// total weight is zero), decrement that inventory under a guard that refuses to go negative,
    /// delete the inventory row when it reaches zero, and append a win record. Any failure rolls
    /// the whole sequence back, including the voucher decrement.
    async fn draw_prize(&self, code: &str) -> Result<DrawResult, LedgerError>;

    /// Create a prize definition, optionally seeding its inventory.
    async fn create_prize(&self, prize: NewPrize) -> Result<Prize, LedgerError>;

    /// Set a prize's inventory. A value of zero (or less) removes the inventory row, taking the
    /// prize out of the draw pool.
    async fn set_prize_remaining(&self, prize_id: i64, remaining: i64) -> Result<(), LedgerError>;

    /// Append a track to the party playlist.
    async fn insert_track(&self, track: NewTrack) -> Result<Track, LedgerError>;
}

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("We have an internal database engine error: {0}")]
    DatabaseError(String),
    #[error("The requested voucher (internal id {0}) does not exist")]
    VoucherIdNotFound(i64),
    #[error("The voucher with code [{0}] does not exist")]
    VoucherNotFound(String),
    #[error("Voucher has no remaining games")]
    NoRemainingGames,
    #[error("The voucher [{0}] is not assigned to any user")]
    VoucherUnassigned(String),
    #[error("Could not generate a unique voucher code within the retry budget")]
    CodeSpaceExhausted,
    #[error("No prizes remaining")]
    NoPrizesAvailable,
    #[error("The prize just ran out, retry the draw")]
    PrizeJustRanOut,
    #[error("A prize named [{0}] already exists")]
    PrizeAlreadyExists(String),
    #[error("[{0}] is not a valid prize name")]
    InvalidPrizeName(String),
    #[error("The requested prize (id {0}) does not exist")]
    PrizeNotFound(i64),
    #[error("The message record {0} does not exist")]
    MessageRecordNotFound(i64),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::DatabaseError(e.to_string())
    }
}
