use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db::traits::LedgerError,
    db_types::{DrawCandidate, NewPrize, Prize, PrizeListing, PrizeWinRecord},
};

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(de) if de.is_unique_violation())
}

pub async fn insert_prize(prize: &NewPrize, conn: &mut SqliteConnection) -> Result<Prize, LedgerError> {
    let row = sqlx::query_as(
        r#"
            INSERT INTO prizes (name, friendly_name, weight)
            VALUES ($1, $2, $3)
            RETURNING *;
        "#,
    )
    .bind(&prize.name)
    .bind(&prize.friendly_name)
    .bind(prize.weight)
    .fetch_one(conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            LedgerError::PrizeAlreadyExists(prize.name.clone())
        } else {
            e.into()
        }
    })?;
    Ok(row)
}

pub async fn prize_exists(prize_id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM prizes WHERE id = $1").bind(prize_id).fetch_optional(conn).await?;
    Ok(row.is_some())
}

/// Sets the inventory for a prize, creating the row if it is absent.
pub async fn upsert_remaining(prize_id: i64, remaining: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            INSERT INTO prize_remaining (prize_id, remaining) VALUES ($1, $2)
            ON CONFLICT (prize_id) DO UPDATE SET remaining = excluded.remaining;
        "#,
    )
    .bind(prize_id)
    .bind(remaining)
    .execute(conn)
    .await?;
    Ok(())
}

/// Removes the inventory row, taking the prize out of the draw pool.
pub async fn delete_remaining(prize_id: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM prize_remaining WHERE prize_id = $1").bind(prize_id).execute(conn).await?;
    Ok(())
}

pub async fn fetch_remaining(prize_id: i64, conn: &mut SqliteConnection) -> Result<Option<i64>, sqlx::Error> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT remaining FROM prize_remaining WHERE prize_id = $1")
        .bind(prize_id)
        .fetch_optional(conn)
        .await?;
    Ok(row.map(|(r,)| r))
}

/// Returns every prize definition with its inventory. Prizes without an inventory row come back
/// with `remaining = None`.
pub async fn fetch_prizes(conn: &mut SqliteConnection) -> Result<Vec<PrizeListing>, sqlx::Error> {
    let prizes = sqlx::query_as(
        r#"
            SELECT p.id, p.name, p.friendly_name, p.weight, r.remaining
            FROM prizes p
            LEFT JOIN prize_remaining r ON r.prize_id = p.id
            ORDER BY p.id ASC;
        "#,
    )
    .fetch_all(conn)
    .await?;
    Ok(prizes)
}

/// Returns the current draw pool: every prize with at least one unit of inventory.
pub async fn draw_candidates(conn: &mut SqliteConnection) -> Result<Vec<DrawCandidate>, sqlx::Error> {
    let candidates = sqlx::query_as(
        r#"
            SELECT p.id, p.name, p.friendly_name, p.weight, r.remaining
            FROM prizes p
            JOIN prize_remaining r ON r.prize_id = p.id
            WHERE r.remaining > 0
            ORDER BY p.id ASC;
        "#,
    )
    .fetch_all(conn)
    .await?;
    Ok(candidates)
}

/// Decrements the inventory for a prize under a positivity guard. Returns the new remaining count,
/// or `None` when the inventory was already gone (the caller lost a race).
pub async fn decrement_remaining(prize_id: i64, conn: &mut SqliteConnection) -> Result<Option<i64>, sqlx::Error> {
    let row: Option<(i64,)> = sqlx::query_as(
        r#"
            UPDATE prize_remaining
            SET remaining = remaining - 1
            WHERE prize_id = $1 AND remaining > 0
            RETURNING remaining;
        "#,
    )
    .bind(prize_id)
    .fetch_optional(conn)
    .await?;
    Ok(row.map(|(r,)| r))
}

/// Appends an entry to the win log.
pub async fn insert_win(
    user_id: i64,
    prize_id: i64,
    won_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<i64, sqlx::Error> {
    let (id,): (i64,) = sqlx::query_as(
        r#"
            INSERT INTO prize_wins (user_id, prize_id, won_at)
            VALUES ($1, $2, $3)
            RETURNING id;
        "#,
    )
    .bind(user_id)
    .bind(prize_id)
    .bind(won_at)
    .fetch_one(conn)
    .await?;
    debug!("🎁 Win #{id} recorded for user {user_id} (prize {prize_id})");
    Ok(id)
}

/// Fetches win-log entries joined with their prize, newest first.
pub async fn fetch_wins(
    user_id: Option<i64>,
    limit: i64,
    offset: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<PrizeWinRecord>, sqlx::Error> {
    let wins = sqlx::query_as(
        r#"
            SELECT w.id, w.user_id, w.won_at, p.id AS prize_id, p.name, p.friendly_name, p.weight
            FROM prize_wins w
            JOIN prizes p ON p.id = w.prize_id
            WHERE ($1 IS NULL OR w.user_id = $1)
            ORDER BY w.won_at DESC, w.id DESC
            LIMIT $2 OFFSET $3;
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(conn)
    .await?;
    Ok(wins)
}

pub async fn count_wins(user_id: Option<i64>, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM prize_wins WHERE ($1 IS NULL OR user_id = $1)")
            .bind(user_id)
            .fetch_one(conn)
            .await?;
    Ok(count)
}
