use chrono::Utc;
use log::trace;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db::traits::{LedgerError, TotalGamesAdjustment, VoucherQueryFilter},
    db_types::{NewVoucher, Voucher},
};

pub async fn fetch_voucher_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Voucher>, sqlx::Error> {
    let voucher = sqlx::query_as("SELECT * FROM vouchers WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(voucher)
}

pub async fn fetch_voucher_by_code(code: &str, conn: &mut SqliteConnection) -> Result<Option<Voucher>, sqlx::Error> {
    let voucher = sqlx::query_as("SELECT * FROM vouchers WHERE code = $1").bind(code).fetch_optional(conn).await?;
    Ok(voucher)
}

/// Inserts a brand-new voucher row. Fails with a unique violation if the code is already taken;
/// callers own the retry loop.
pub async fn insert_voucher(
    voucher: &NewVoucher,
    code: &str,
    conn: &mut SqliteConnection,
) -> Result<Voucher, sqlx::Error> {
    let voucher = sqlx::query_as(
        r#"
            INSERT INTO vouchers (code, user_id, issued_by, use_count, total_games, created_at)
            VALUES ($1, $2, $3, 0, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(code)
    .bind(voucher.user_id)
    .bind(voucher.issued_by)
    .bind(voucher.total_games)
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;
    Ok(voucher)
}

/// Reassigns the oldest released voucher (no owner, games remaining) to the given user in a single
/// atomic statement. Returns `None` when no released voucher exists.
pub async fn reassign_released(
    voucher: &NewVoucher,
    conn: &mut SqliteConnection,
) -> Result<Option<Voucher>, sqlx::Error> {
    let voucher = sqlx::query_as(
        r#"
            UPDATE vouchers
            SET user_id = $1, issued_by = $2, use_count = 0, total_games = $3, used_at = NULL
            WHERE id = (
                SELECT id FROM vouchers
                WHERE user_id IS NULL AND use_count < total_games
                ORDER BY created_at ASC, id ASC
                LIMIT 1
            )
            RETURNING *;
        "#,
    )
    .bind(voucher.user_id)
    .bind(voucher.issued_by)
    .bind(voucher.total_games)
    .fetch_optional(conn)
    .await?;
    Ok(voucher)
}

/// Recycles the oldest exhausted voucher for the given user, resetting its counters. Rows that
/// have never been played sort first (`used_at` NULL). Returns `None` when no voucher is
/// exhausted.
pub async fn recycle_exhausted(
    voucher: &NewVoucher,
    conn: &mut SqliteConnection,
) -> Result<Option<Voucher>, sqlx::Error> {
    let voucher = sqlx::query_as(
        r#"
            UPDATE vouchers
            SET user_id = $1, issued_by = $2, use_count = 0, total_games = $3, used_at = NULL
            WHERE id = (
                SELECT id FROM vouchers
                WHERE use_count >= total_games
                ORDER BY used_at ASC NULLS FIRST, id ASC
                LIMIT 1
            )
            RETURNING *;
        "#,
    )
    .bind(voucher.user_id)
    .bind(voucher.issued_by)
    .bind(voucher.total_games)
    .fetch_optional(conn)
    .await?;
    Ok(voucher)
}

/// Consumes one game from the voucher with the given id. The guard in the WHERE clause makes this
/// a compare-and-swap: the statement is a no-op (returns `None`) once capacity is spent.
pub async fn consume_game_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Voucher>, sqlx::Error> {
    let voucher = sqlx::query_as(
        r#"
            UPDATE vouchers
            SET use_count = use_count + 1, used_at = $2
            WHERE id = $1 AND use_count < total_games
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(Utc::now())
    .fetch_optional(conn)
    .await?;
    Ok(voucher)
}

/// Same compare-and-swap as [`consume_game_by_id`], keyed by voucher code.
pub async fn consume_game_by_code(code: &str, conn: &mut SqliteConnection) -> Result<Option<Voucher>, sqlx::Error> {
    let voucher = sqlx::query_as(
        r#"
            UPDATE vouchers
            SET use_count = use_count + 1, used_at = $2
            WHERE code = $1 AND use_count < total_games
            RETURNING *;
        "#,
    )
    .bind(code)
    .bind(Utc::now())
    .fetch_optional(conn)
    .await?;
    Ok(voucher)
}

/// Adjusts `total_games` on a voucher. Capacity never goes below zero, but it may drop below
/// `use_count`, which leaves the voucher exhausted.
pub async fn adjust_total_games(
    id: i64,
    adjustment: TotalGamesAdjustment,
    conn: &mut SqliteConnection,
) -> Result<Voucher, LedgerError> {
    let (sql, value) = match adjustment {
        TotalGamesAdjustment::Add(n) => {
            ("UPDATE vouchers SET total_games = MAX(total_games + $2, 0) WHERE id = $1 RETURNING *", n)
        },
        TotalGamesAdjustment::Decrease(n) => {
            ("UPDATE vouchers SET total_games = MAX(total_games - $2, 0) WHERE id = $1 RETURNING *", n)
        },
        TotalGamesAdjustment::Set(n) => {
            ("UPDATE vouchers SET total_games = MAX($2, 0) WHERE id = $1 RETURNING *", n)
        },
    };
    let voucher = sqlx::query_as(sql)
        .bind(id)
        .bind(value)
        .fetch_optional(conn)
        .await?
        .ok_or(LedgerError::VoucherIdNotFound(id))?;
    Ok(voucher)
}

/// Fetches vouchers according to criteria specified in the `VoucherQueryFilter`.
///
/// Resulting vouchers are ordered by `created_at` in descending order.
pub async fn search_vouchers(
    query: VoucherQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<Voucher>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM vouchers ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(user_id) = query.user_id {
        where_clause.push("user_id = ");
        where_clause.push_bind_unseparated(user_id);
    }
    if let Some(code) = query.code {
        where_clause.push("code = ");
        where_clause.push_bind_unseparated(code);
    }
    if let Some(exhausted) = query.exhausted {
        if exhausted {
            where_clause.push("use_count >= total_games");
        } else {
            where_clause.push("use_count < total_games");
        }
    }
    builder.push(" ORDER BY created_at DESC, id DESC");

    trace!("🎟️ Executing query: {}", builder.sql());
    let vouchers = builder.build_query_as::<Voucher>().fetch_all(conn).await?;
    Ok(vouchers)
}
