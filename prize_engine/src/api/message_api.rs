use std::fmt::Debug;

use crate::{
    db::traits::{LedgerError, MessageQueryFilter, MessageTracking},
    db_types::{NewVoucherMessage, VoucherMessage},
};

/// `MessageApi` owns the delivery-tracking records used by the reconciliation worker.
pub struct MessageApi<B> {
    db: B,
}

impl<B> Debug for MessageApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MessageApi")
    }
}

impl<B> MessageApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> MessageApi<B>
where B: MessageTracking
{
    pub async fn record_message(&self, msg: NewVoucherMessage) -> Result<VoucherMessage, LedgerError> {
        self.db.record_message(msg).await
    }

    pub async fn search_messages(&self, query: MessageQueryFilter) -> Result<Vec<VoucherMessage>, LedgerError> {
        self.db.search_messages(query).await
    }

    pub async fn mark_deleted(&self, id: i64) -> Result<VoucherMessage, LedgerError> {
        self.db.mark_message_deleted(id).await
    }

    pub async fn active_message_exists(&self, user_id: i64, code: &str) -> Result<bool, LedgerError> {
        self.db.active_message_exists(user_id, code).await
    }
}
