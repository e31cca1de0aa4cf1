use rusqlite::Connection;
use std::path::PathBuf;
use tempfile::TempDir;

/// Creates `db.sqlite3` inside `dir` and runs `schema` against it.
pub fn create_store(dir: &TempDir, schema: &str) -> PathBuf {
    let path = dir.path().join("db.sqlite3");
    let conn = Connection::open(&path).expect("create sqlite store");
    conn.execute_batch(schema).expect("apply schema");
    path
}

/// Writes `contents` to `groups.json` inside `dir`.
pub fn write_fallback(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("groups.json");
    std::fs::write(&path, contents).expect("write fallback document");
    path
}
