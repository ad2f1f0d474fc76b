//! Request and response payloads for the admin API.
use serde::{Deserialize, Serialize};

use crate::errors::ServerError;

#[derive(Debug, Clone, Deserialize)]
pub struct IssueVoucherRequest {
    pub user_id: i64,
    #[serde(default)]
    pub issued_by: Option<i64>,
    #[serde(default = "default_total_games")]
    pub total_games: i64,
}

fn default_total_games() -> i64 {
    1
}

/// Capacity adjustment parameters. Exactly one of the fields must be supplied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdjustGamesParams {
    pub add: Option<i64>,
    pub decrease: Option<i64>,
    pub set: Option<i64>,
}

impl AdjustGamesParams {
    pub fn into_adjustment(self) -> Result<prize_engine::TotalGamesAdjustment, ServerError> {
        use prize_engine::TotalGamesAdjustment::*;
        match (self.add, self.decrease, self.set) {
            (Some(n), None, None) => Ok(Add(n)),
            (None, Some(n), None) => Ok(Decrease(n)),
            (None, None, Some(n)) => Ok(Set(n)),
            _ => Err(ServerError::InvalidRequestBody(
                "Provide exactly one of 'add', 'decrease' or 'set'".to_string(),
            )),
        }
    }
}

/// Body of the deprecated redeem-by-code endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RedeemRequest {
    pub code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DrawRequest {
    pub voucher: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPrizeRequest {
    pub name: String,
    pub friendly_name: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub remaining: Option<i64>,
}

fn default_weight() -> f64 {
    1.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetRemainingRequest {
    pub remaining: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VoucherSearchQuery {
    pub user_id: Option<i64>,
    pub code: Option<String>,
    pub active_only: Option<bool>,
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WinCountQuery {
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WinCount {
    pub total: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMessageRequest {
    pub user_id: i64,
    pub voucher_code: String,
    pub message_id: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagesQuery {
    pub user_id: Option<i64>,
    pub voucher_code: Option<String>,
    pub active_only: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTrackRequest {
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub url: Option<String>,
    pub added_by: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Into<String>>(message: S) -> Self {
        Self { success: true, message: message.into() }
    }
}
