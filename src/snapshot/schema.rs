//! SQLite schema of a snapshot database

/// Schema of `snapshot.db`
///
/// `rank` is the 1-based fetch position of the document within the crawl.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    rank INTEGER PRIMARY KEY,
    url TEXT NOT NULL UNIQUE,
    host TEXT NOT NULL,
    docno TEXT,
    content_hash TEXT,
    outlink_count INTEGER NOT NULL DEFAULT 0,
    inlink_count INTEGER NOT NULL DEFAULT 0,
    depth INTEGER NOT NULL,
    parent TEXT,
    oracle_score REAL,
    http_status INTEGER
);

CREATE INDEX IF NOT EXISTS idx_documents_host ON documents(host);
CREATE INDEX IF NOT EXISTS idx_documents_docno ON documents(docno);
"#;

/// Schema of the per-experiment `content.db`
pub const CONTENT_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS contents (
    content_hash TEXT PRIMARY KEY,
    url TEXT NOT NULL,
    content TEXT NOT NULL,
    stored_at TEXT NOT NULL
);
"#;

pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)
}

pub fn initialize_content_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(CONTENT_SCHEMA_SQL)
}
