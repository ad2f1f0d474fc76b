use crate::db_types::{DrawResult, Voucher};

/// Emitted after a prize draw commits. Carries the full draw outcome, including the voucher state
/// after the game was consumed.
#[derive(Debug, Clone)]
pub struct PrizeWonEvent {
    pub result: DrawResult,
}

impl PrizeWonEvent {
    pub fn new(result: DrawResult) -> Self {
        Self { result }
    }
}

/// Emitted after a voucher is issued (or reissued) to a user. The delivery worker picks these up
/// on its next pass regardless, so subscribers should treat this as a latency optimisation only.
#[derive(Debug, Clone)]
pub struct VoucherIssuedEvent {
    pub voucher: Voucher,
}

impl VoucherIssuedEvent {
    pub fn new(voucher: Voucher) -> Self {
        Self { voucher }
    }
}
