use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

//--------------------------------------      Voucher       ----------------------------------------------------------

/// A redeemable code granting a bounded number of prize-draw attempts to one user at a time.
///
/// Voucher rows are never physically deleted. A voucher with `user_id = NULL` is available for
/// reissue; a voucher with `use_count >= total_games` is exhausted and may be recycled for a new
/// user (its counters are reset on reassignment).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Voucher {
    pub id: i64,
    pub code: String,
    pub user_id: Option<i64>,
    pub issued_by: Option<i64>,
    pub use_count: i64,
    pub total_games: i64,
    pub created_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

impl Voucher {
    pub fn is_exhausted(&self) -> bool {
        self.use_count >= self.total_games
    }

    pub fn remaining_games(&self) -> i64 {
        (self.total_games - self.use_count).max(0)
    }
}

/// The parameters for issuing (or reusing) a voucher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVoucher {
    pub user_id: i64,
    pub issued_by: Option<i64>,
    pub total_games: i64,
}

impl NewVoucher {
    pub fn new(user_id: i64) -> Self {
        Self { user_id, issued_by: None, total_games: 1 }
    }
}

//--------------------------------------       Prize        ----------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Prize {
    pub id: i64,
    pub name: String,
    pub friendly_name: String,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPrize {
    pub name: String,
    pub friendly_name: String,
    pub weight: f64,
    /// Initial inventory. `None` creates the prize definition without adding it to the draw pool.
    pub remaining: Option<i64>,
}

/// A prize definition joined with its current inventory. `remaining = None` means the prize is not
/// in the draw pool (its inventory row is absent).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PrizeListing {
    pub id: i64,
    pub name: String,
    pub friendly_name: String,
    pub weight: f64,
    pub remaining: Option<i64>,
}

/// A draw-pool candidate: a prize with `remaining > 0` units of inventory.
#[derive(Debug, Clone, FromRow)]
pub struct DrawCandidate {
    pub id: i64,
    pub name: String,
    pub friendly_name: String,
    pub weight: f64,
    pub remaining: i64,
}

impl DrawCandidate {
    pub fn prize(&self) -> Prize {
        Prize {
            id: self.id,
            name: self.name.clone(),
            friendly_name: self.friendly_name.clone(),
            weight: self.weight,
        }
    }
}

//--------------------------------------      PrizeWin      ----------------------------------------------------------

/// One row of the append-only win log, joined with the prize that was won.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PrizeWinRecord {
    pub id: i64,
    pub user_id: i64,
    pub won_at: DateTime<Utc>,
    pub prize_id: i64,
    pub name: String,
    pub friendly_name: String,
    pub weight: f64,
}

impl PrizeWinRecord {
    pub fn prize(&self) -> Prize {
        Prize {
            id: self.prize_id,
            name: self.name.clone(),
            friendly_name: self.friendly_name.clone(),
            weight: self.weight,
        }
    }
}

/// The outcome of a successful prize draw.
#[derive(Debug, Clone, Serialize)]
pub struct DrawResult {
    pub win_id: i64,
    pub user_id: i64,
    pub prize: Prize,
    pub won_at: DateTime<Utc>,
    /// The voucher after one unit of capacity was consumed by this draw.
    pub voucher: Voucher,
}

//--------------------------------------   VoucherMessage   ----------------------------------------------------------

/// A delivery-tracking record for a voucher notification sent to a user.
///
/// `deleted_at` is a soft-delete marker; the reconciliation worker sets it once the underlying
/// voucher is exhausted or gone. The local soft-delete is authoritative, retraction of the
/// external chat message is best-effort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct VoucherMessage {
    pub id: i64,
    pub user_id: i64,
    pub voucher_code: String,
    pub message_id: i64,
    pub sent_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVoucherMessage {
    pub user_id: i64,
    pub voucher_code: String,
    pub message_id: i64,
}

//--------------------------------------       Track        ----------------------------------------------------------

/// A playlist entry for the party player. Fan-out of player state shares the broadcast channel
/// with prize-win events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Track {
    pub id: i64,
    pub title: String,
    pub artist: String,
    pub url: Option<String>,
    pub added_by: i64,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTrack {
    pub title: String,
    pub artist: String,
    pub url: Option<String>,
    pub added_by: i64,
}
