//! Pool creation against file-backed and in-memory databases.

use synapsesync::database;
use synapsesync::services::event_store;

#[tokio::test]
async fn file_database_creates_missing_parent_directory() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("data").join("nested").join("synapsesync.db");
    let url = format!("sqlite://{}", db_path.display());

    let pool = database::new_pool(&url).await.unwrap();

    assert!(db_path.exists());
    assert_eq!(event_store::count_for_module(&pool, "github").await.unwrap(), 0);
}

#[tokio::test]
async fn in_memory_database_keeps_its_schema() {
    let pool = database::new_pool("sqlite::memory:").await.unwrap();

    event_store::count_for_module(&pool, "github").await.unwrap();
    event_store::count_for_module(&pool, "github").await.unwrap();
}
