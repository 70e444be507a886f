//! Experiment-wide page content store

use crate::snapshot::schema::initialize_content_schema;
use crate::snapshot::SnapshotResult;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Append-only content store keyed by content hash
///
/// Snapshot rows reference content through their `content_hash`. Identical
/// pages are stored once.
#[derive(Debug)]
pub struct ContentStore {
    conn: Mutex<Connection>,
    path: PathBuf,
}

impl ContentStore {
    pub fn open(path: &Path) -> SnapshotResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;
        initialize_content_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stores `content` unless its hash is already present; returns whether it was new
    pub fn put(&self, content_hash: &str, url: &str, content: &str) -> SnapshotResult<bool> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO contents (content_hash, url, content, stored_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![content_hash, url, content, Utc::now().to_rfc3339()],
        )?;
        Ok(inserted > 0)
    }

    pub fn get(&self, content_hash: &str) -> SnapshotResult<Option<String>> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let content = conn
            .query_row(
                "SELECT content FROM contents WHERE content_hash = ?1",
                params![content_hash],
                |row| row.get(0),
            )
            .optional()?;
        Ok(content)
    }

    pub fn len(&self) -> SnapshotResult<usize> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM contents", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> SnapshotResult<bool> {
        Ok(self.len()? == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_put_and_get() {
        let dir = TempDir::new().unwrap();
        let store = ContentStore::open(&dir.path().join("exp").join("content.db")).unwrap();
        assert!(store.is_empty().unwrap());

        assert!(store.put("h1", "http://a.example/", "<p>a</p>").unwrap());
        assert_eq!(store.get("h1").unwrap().as_deref(), Some("<p>a</p>"));
        assert_eq!(store.get("missing").unwrap(), None);
    }

    #[test]
    fn test_duplicate_hash_is_stored_once() {
        let dir = TempDir::new().unwrap();
        let store = ContentStore::open(&dir.path().join("content.db")).unwrap();

        assert!(store.put("h1", "http://a.example/", "same").unwrap());
        assert!(!store.put("h1", "http://b.example/", "same").unwrap());
        assert_eq!(store.len().unwrap(), 1);
    }
}
