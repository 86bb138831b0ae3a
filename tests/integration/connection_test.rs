//! Connection integration tests.

use super::common::{music_db, mysql_config};
use db_chat::config::ConnectionConfig;
use db_chat::connection::Connector;
use db_chat::db::DatabaseBackend;
use pretty_assertions::assert_eq;
use tokio_test::assert_ok;

#[tokio::test]
async fn test_sqlite_handle_describes_and_runs() {
    let (_dir, config) = music_db().await;
    let handle = Connector::new().connect(&config).await.unwrap();

    let info = handle.table_info().await.unwrap();
    assert!(info.contains("CREATE TABLE `album`"));
    assert!(info.contains("CREATE TABLE `artist`"));
    assert!(info.contains("Aerosmith"));

    assert_eq!(handle.run("SELECT 1 AS one").await.unwrap(), "one\n1");
    assert_eq!(handle.backend(), DatabaseBackend::Sqlite);
    assert_ok!(handle.close().await);
}

#[tokio::test]
async fn test_two_connects_are_independent() {
    let (_dir, config) = music_db().await;
    let connector = Connector::new();

    let first = connector.connect(&config).await.unwrap();
    let second = connector.connect(&config).await.unwrap();

    first.close().await.unwrap();

    // Closing one handle leaves the other usable.
    assert_eq!(
        second.run("SELECT COUNT(*) AS n FROM artist").await.unwrap(),
        "n\n3"
    );
    assert!(!second.table_info().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_sqlite_file_is_connection_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = ConnectionConfig {
        backend: DatabaseBackend::Sqlite,
        database: dir.path().join("absent.db").to_string_lossy().into_owned(),
        ..ConnectionConfig::default()
    };

    let err = Connector::new().connect(&config).await.unwrap_err();
    assert_eq!(err.category(), "Connection Error");
}

#[tokio::test]
async fn test_query_error_keeps_handle_usable() {
    let (_dir, config) = music_db().await;
    let handle = Connector::new().connect(&config).await.unwrap();

    let err = handle.run("SELECT * FROM no_such_table").await.unwrap_err();
    assert_eq!(err.category(), "Query Error");
    assert_ok!(handle.run("SELECT 1").await);
}

#[tokio::test]
async fn test_mysql_handle_describes_and_runs() {
    let Some(config) = mysql_config() else {
        eprintln!("Skipping test: DATABASE_URL not set to a mysql:// URL");
        return;
    };

    let handle = Connector::new().connect(&config).await.unwrap();
    assert!(!handle.table_info().await.unwrap().is_empty());
    assert_eq!(handle.run("SELECT 1 AS one").await.unwrap(), "one\n1");
    handle.close().await.unwrap();
}
