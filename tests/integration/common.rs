//! Shared fixtures: a small SQLite database on disk.

use db_chat::config::ConnectionConfig;
use db_chat::db::DatabaseBackend;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::Path;
use tempfile::TempDir;

/// Rows in the `artist` table.
pub const ARTIST_ROWS: usize = 3;
/// Rows in the `album` table.
pub const ALBUM_ROWS: usize = 5;

/// Creates `music.db` with `artist` and `album` tables in a fresh temp dir.
pub async fn music_db() -> (TempDir, ConnectionConfig) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("music.db");
    seed(&path).await;

    let config = ConnectionConfig {
        backend: DatabaseBackend::Sqlite,
        database: path.to_string_lossy().into_owned(),
        ..ConnectionConfig::default()
    };
    (dir, config)
}

async fn seed(path: &Path) {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();

    for stmt in [
        "CREATE TABLE artist (artist_id INTEGER PRIMARY KEY, name TEXT NOT NULL)",
        "CREATE TABLE album (
            album_id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            artist_id INTEGER NOT NULL REFERENCES artist(artist_id)
        )",
        "INSERT INTO artist VALUES (1, 'AC/DC'), (2, 'Accept'), (3, 'Aerosmith')",
        "INSERT INTO album VALUES
            (1, 'For Those About To Rock', 1),
            (2, 'Let There Be Rock', 1),
            (3, 'Balls to the Wall', 2),
            (4, 'Restless and Wild', 2),
            (5, 'Big Ones', 3)",
    ] {
        sqlx::query(stmt).execute(&pool).await.unwrap();
    }

    pool.close().await;
}

/// The MySQL settings from DATABASE_URL, when it is a mysql:// URL.
pub fn mysql_config() -> Option<ConnectionConfig> {
    let url = std::env::var("DATABASE_URL").ok()?;
    if !url.starts_with("mysql://") {
        return None;
    }
    ConnectionConfig::from_connection_string(&url).ok()
}
