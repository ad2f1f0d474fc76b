use prize_engine::{
    db_types::NewVoucherMessage,
    LedgerError,
    MessageQueryFilter,
    MessageTracking,
};

use crate::support::prepare_env::{prepare_test_env, random_db_path, tear_down};

mod support;

fn msg(user_id: i64, code: &str, message_id: i64) -> NewVoucherMessage {
    NewVoucherMessage { user_id, voucher_code: code.into(), message_id }
}

#[tokio::test]
async fn records_are_created_active_and_searchable() {
    let db = prepare_test_env(&random_db_path()).await;
    let rec = db.record_message(msg(1, "0042", 555)).await.unwrap();
    assert!(rec.deleted_at.is_none());
    db.record_message(msg(2, "0043", 556)).await.unwrap();

    let all = db.search_messages(MessageQueryFilter::default()).await.unwrap();
    assert_eq!(all.len(), 2);
    let for_user = db
        .search_messages(MessageQueryFilter { user_id: Some(1), ..Default::default() })
        .await
        .unwrap();
    assert_eq!(for_user.len(), 1);
    assert_eq!(for_user[0].message_id, 555);
    let by_code = db
        .search_messages(MessageQueryFilter { voucher_code: Some("0043".into()), ..Default::default() })
        .await
        .unwrap();
    assert_eq!(by_code.len(), 1);
    tear_down(db).await;
}

#[tokio::test]
async fn soft_delete_is_idempotent() {
    let db = prepare_test_env(&random_db_path()).await;
    let rec = db.record_message(msg(1, "0042", 555)).await.unwrap();

    let deleted = db.mark_message_deleted(rec.id).await.unwrap();
    let stamp = deleted.deleted_at.unwrap();
    // A second delete keeps the original timestamp.
    let deleted_again = db.mark_message_deleted(rec.id).await.unwrap();
    assert_eq!(deleted_again.deleted_at, Some(stamp));

    let err = db.mark_message_deleted(9999).await.unwrap_err();
    assert!(matches!(err, LedgerError::MessageRecordNotFound(9999)));

    let active = db.search_messages(MessageQueryFilter::active()).await.unwrap();
    assert!(active.is_empty());
    let deleted = db
        .search_messages(MessageQueryFilter { deleted: Some(true), ..Default::default() })
        .await
        .unwrap();
    assert_eq!(deleted.len(), 1);
    tear_down(db).await;
}

#[tokio::test]
async fn active_message_lookup_ignores_deleted_records() {
    let db = prepare_test_env(&random_db_path()).await;
    let rec = db.record_message(msg(1, "0042", 555)).await.unwrap();

    assert!(db.active_message_exists(1, "0042").await.unwrap());
    assert!(!db.active_message_exists(1, "0099").await.unwrap());
    assert!(!db.active_message_exists(2, "0042").await.unwrap());

    db.mark_message_deleted(rec.id).await.unwrap();
    assert!(!db.active_message_exists(1, "0042").await.unwrap());
    tear_down(db).await;
}
