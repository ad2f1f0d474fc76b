use chrono::Utc;
use log::trace;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db::traits::{LedgerError, MessageQueryFilter},
    db_types::{NewVoucherMessage, VoucherMessage},
};

pub async fn insert_message(
    msg: &NewVoucherMessage,
    conn: &mut SqliteConnection,
) -> Result<VoucherMessage, sqlx::Error> {
    let record = sqlx::query_as(
        r#"
            INSERT INTO voucher_messages (user_id, voucher_code, message_id, sent_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(msg.user_id)
    .bind(&msg.voucher_code)
    .bind(msg.message_id)
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;
    Ok(record)
}

/// Fetches tracking records according to criteria specified in the `MessageQueryFilter`.
///
/// Results are ordered by `sent_at` in ascending order.
pub async fn search_messages(
    query: MessageQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<VoucherMessage>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM voucher_messages ");
    let has_filter = query.user_id.is_some() || query.voucher_code.is_some() || query.deleted.is_some();
    if has_filter {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(user_id) = query.user_id {
        where_clause.push("user_id = ");
        where_clause.push_bind_unseparated(user_id);
    }
    if let Some(code) = query.voucher_code {
        where_clause.push("voucher_code = ");
        where_clause.push_bind_unseparated(code);
    }
    if let Some(deleted) = query.deleted {
        if deleted {
            where_clause.push("deleted_at IS NOT NULL");
        } else {
            where_clause.push("deleted_at IS NULL");
        }
    }
    builder.push(" ORDER BY sent_at ASC, id ASC");

    trace!("📬 Executing query: {}", builder.sql());
    let records = builder.build_query_as::<VoucherMessage>().fetch_all(conn).await?;
    Ok(records)
}

/// Soft-deletes a tracking record. A record that is already deleted keeps its original timestamp.
pub async fn mark_deleted(id: i64, conn: &mut SqliteConnection) -> Result<VoucherMessage, LedgerError> {
    let record = sqlx::query_as(
        r#"
            UPDATE voucher_messages
            SET deleted_at = COALESCE(deleted_at, $2)
            WHERE id = $1
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(Utc::now())
    .fetch_optional(conn)
    .await?
    .ok_or(LedgerError::MessageRecordNotFound(id))?;
    Ok(record)
}

pub async fn active_exists(user_id: i64, code: &str, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let row: Option<(i64,)> = sqlx::query_as(
        "SELECT id FROM voucher_messages WHERE user_id = $1 AND voucher_code = $2 AND deleted_at IS NULL LIMIT 1",
    )
    .bind(user_id)
    .bind(code)
    .fetch_optional(conn)
    .await?;
    Ok(row.is_some())
}
