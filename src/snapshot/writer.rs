//! SQLite snapshot writer

use crate::registry::UrlRecord;
use crate::snapshot::schema::initialize_schema;
use crate::snapshot::{
    SnapshotError, SnapshotHandle, SnapshotManifest, SnapshotRequest, SnapshotResult,
    SnapshotWriter, DATABASE_FILE, MANIFEST_FILE,
};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

/// Writes each snapshot as `<exp_dir>/<label>/{manifest.toml,snapshot.db}`
///
/// The snapshot is assembled in a hidden sibling directory and renamed into
/// place, so a labeled directory is either complete or absent.
#[derive(Debug, Clone)]
pub struct SqliteSnapshotWriter {
    exp_dir: PathBuf,
}

impl SqliteSnapshotWriter {
    pub fn new(exp_dir: impl Into<PathBuf>) -> Self {
        Self {
            exp_dir: exp_dir.into(),
        }
    }

    pub fn exp_dir(&self) -> &Path {
        &self.exp_dir
    }
}

impl SnapshotWriter for SqliteSnapshotWriter {
    fn write(&self, request: SnapshotRequest) -> SnapshotResult<SnapshotHandle> {
        let label = request.label.to_string();
        let final_dir = self.exp_dir.join(&label);
        if final_dir.exists() {
            return Err(SnapshotError::AlreadyExists(label));
        }

        std::fs::create_dir_all(&self.exp_dir)?;
        let tmp_dir = self.exp_dir.join(format!(".tmp-{}", label));
        if tmp_dir.exists() {
            // Leftover of an interrupted write
            std::fs::remove_dir_all(&tmp_dir)?;
        }
        std::fs::create_dir(&tmp_dir)?;

        if let Err(e) = write_contents(&tmp_dir, &request) {
            if let Err(cleanup) = std::fs::remove_dir_all(&tmp_dir) {
                tracing::warn!("Failed to remove {}: {}", tmp_dir.display(), cleanup);
            }
            return Err(e);
        }
        std::fs::rename(&tmp_dir, &final_dir)?;

        tracing::info!(
            "Wrote snapshot {} ({} pages) to {}",
            label,
            request.records.len(),
            final_dir.display()
        );

        Ok(SnapshotHandle {
            label: request.label,
            dir: final_dir,
            page_count: request.records.len(),
        })
    }
}

fn write_contents(dir: &Path, request: &SnapshotRequest) -> SnapshotResult<()> {
    write_documents(&dir.join(DATABASE_FILE), &request.records)?;
    SnapshotManifest::from_request(request).save(&dir.join(MANIFEST_FILE))
}

fn write_documents(path: &Path, records: &[UrlRecord]) -> SnapshotResult<()> {
    let mut conn = Connection::open(path)?;

    // Single writer, read-only afterwards: no WAL side files
    conn.execute_batch(
        "
        PRAGMA journal_mode = DELETE;
        PRAGMA synchronous = NORMAL;
    ",
    )?;
    initialize_schema(&conn)?;

    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO documents (rank, url, host, docno, content_hash, outlink_count,
                                    inlink_count, depth, parent, oracle_score, http_status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )?;
        for (i, record) in records.iter().enumerate() {
            stmt.execute(params![
                (i + 1) as i64,
                record.url.as_str(),
                record.host(),
                record.docno,
                record.content_hash,
                record.outlink_count,
                record.inlink_count,
                record.depth,
                record.parent.as_ref().map(|p| p.as_str()),
                record.oracle_score,
                record.http_status,
            ])?;
        }
    }
    tx.commit()?;

    Ok(())
}
