//! Voucher delivery and reconciliation worker.
//!
//! The worker runs on a fixed interval and keeps the chat backend in sync with the ledger:
//! * Retraction pass: any active delivery record whose voucher is gone, exhausted or reassigned
//!   has its chat message retracted (best effort), then the record is soft-deleted locally. The
//!   local soft delete is authoritative; a failed retraction is logged and never retried.
//! * Delivery pass: any assigned, non-exhausted voucher without an active delivery record gets a
//!   fresh chat message, which is then recorded for later retraction.
use std::{sync::Arc, time::Duration};

use log::*;
use prize_engine::{
    db_types::{NewVoucherMessage, VoucherMessage},
    LedgerError,
    LedgerQueries,
    MessageQueryFilter,
    MessageTracking,
    VoucherQueryFilter,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::delivery::ChatDelivery;

/// Spawns the reconciliation loop. The loop runs one sync immediately and then once per
/// `interval` until the cancellation token fires.
pub fn start_sync_worker<B, D>(
    db: B,
    delivery: Arc<D>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()>
where
    B: LedgerQueries + MessageTracking + Send + Sync + 'static,
    D: ChatDelivery + 'static,
{
    tokio::spawn(async move {
        info!("🕰️ Voucher sync worker started. Polling every {}s", interval.as_secs());
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("🕰️ Voucher sync worker shutting down");
                    break;
                },
                _ = ticker.tick() => {
                    match run_retraction_pass(&db, &*delivery).await {
                        Ok(0) => {},
                        Ok(n) => info!("📬 Retracted {n} stale voucher message(s)"),
                        Err(e) => warn!("📬 Retraction pass failed: {e}"),
                    }
                    match run_delivery_pass(&db, &*delivery).await {
                        Ok(0) => trace!("🕰️ Voucher sync pass complete. Nothing to deliver"),
                        Ok(n) => info!("📬 Delivered {n} voucher message(s)"),
                        Err(e) => warn!("📬 Delivery pass failed: {e}"),
                    }
                },
            }
        }
    })
}

/// Retracts and soft-deletes every active delivery record whose voucher no longer belongs to the
/// recipient. Returns the number of records retired.
pub async fn run_retraction_pass<B, D>(db: &B, delivery: &D) -> Result<usize, LedgerError>
where
    B: LedgerQueries + MessageTracking,
    D: ChatDelivery + ?Sized,
{
    let active = db.search_messages(MessageQueryFilter::active()).await?;
    let mut retired = 0;
    for message in active {
        if !message_is_stale(db, &message).await? {
            continue;
        }
        // Chat backend first, then the local soft delete. The soft delete happens regardless of
        // the retraction outcome, so a failed retraction is never retried.
        if let Err(e) = delivery.retract(message.user_id, message.message_id).await {
            warn!(
                "📬 Could not retract message {} for chat {}: {e}. Retiring the local record \
                 anyway",
                message.message_id, message.user_id
            );
        } else {
            debug!("📬 Retracted message {} for voucher [{}]", message.message_id, message.voucher_code);
        }
        db.mark_message_deleted(message.id).await?;
        retired += 1;
    }
    Ok(retired)
}

/// Sends a chat message for every assigned, live voucher that has no active delivery record.
/// Returns the number of messages delivered and recorded.
pub async fn run_delivery_pass<B, D>(db: &B, delivery: &D) -> Result<usize, LedgerError>
where
    B: LedgerQueries + MessageTracking,
    D: ChatDelivery + ?Sized,
{
    let filter = VoucherQueryFilter { exhausted: Some(false), ..Default::default() };
    let live = db.search_vouchers(filter).await?;
    let mut delivered = 0;
    for voucher in live {
        let Some(user_id) = voucher.user_id else { continue };
        if db.active_message_exists(user_id, &voucher.code).await? {
            continue;
        }
        let message_id = match delivery.send_voucher(user_id, &voucher.code).await {
            Ok(id) => id,
            Err(e) => {
                warn!("📬 Could not deliver voucher [{}] to chat {user_id}: {e}", voucher.code);
                continue;
            },
        };
        let record =
            NewVoucherMessage { user_id, voucher_code: voucher.code.clone(), message_id };
        db.record_message(record).await?;
        delivered += 1;
        debug!("📬 Voucher [{}] delivered to chat {user_id}", voucher.code);
    }
    Ok(delivered)
}

/// A delivery record is stale when its voucher is missing, exhausted, released, or assigned to
/// someone other than the message recipient.
async fn message_is_stale<B: LedgerQueries>(
    db: &B,
    message: &VoucherMessage,
) -> Result<bool, LedgerError> {
    let voucher = match db.fetch_voucher_by_code(&message.voucher_code).await? {
        Some(v) => v,
        None => return Ok(true),
    };
    Ok(voucher.is_exhausted() || voucher.user_id != Some(message.user_id))
}
