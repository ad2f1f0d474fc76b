use chrono::Utc;
use sqlx::SqliteConnection;

use crate::db_types::{NewTrack, Track};

pub async fn insert_track(track: &NewTrack, conn: &mut SqliteConnection) -> Result<Track, sqlx::Error> {
    let track = sqlx::query_as(
        r#"
            INSERT INTO tracks (title, artist, url, added_by, added_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(&track.title)
    .bind(&track.artist)
    .bind(&track.url)
    .bind(track.added_by)
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;
    Ok(track)
}

/// Returns the playlist in insertion order.
pub async fn fetch_tracks(conn: &mut SqliteConnection) -> Result<Vec<Track>, sqlx::Error> {
    let tracks = sqlx::query_as("SELECT * FROM tracks ORDER BY id ASC").fetch_all(conn).await?;
    Ok(tracks)
}
