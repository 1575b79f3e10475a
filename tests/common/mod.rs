use std::sync::Arc;
use tempfile::TempDir;

use pricewatch_core::db;

/// Creates a fresh migrated database under a temporary directory. The
/// returned TempDir guard must stay alive for the duration of the test.
pub fn setup_db() -> (TempDir, Arc<db::DbPool>) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = db::init(dir.path().to_str().expect("Temp path is not valid utf-8"))
        .expect("Failed to initialize database");
    let pool = db::create_pool(&db_path).expect("Failed to create database pool");
    db::run_migrations(&pool).expect("Failed to run migrations");

    (dir, pool)
}
