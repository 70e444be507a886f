//! Reading snapshots back without a live crawl

use crate::snapshot::{
    SnapshotError, SnapshotLabel, SnapshotManifest, SnapshotResult, DATABASE_FILE, MANIFEST_FILE,
};
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};

/// One row of the `documents` table
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotDocument {
    pub rank: u64,
    pub url: String,
    pub host: String,
    pub docno: Option<String>,
    pub content_hash: Option<String>,
    pub outlink_count: u32,
    pub inlink_count: u32,
    pub depth: u32,
    pub parent: Option<String>,
    pub oracle_score: Option<f64>,
    pub http_status: Option<u16>,
}

impl SnapshotDocument {
    /// Identifier handed to the indexer: the corpus docno, or the URL
    pub fn doc_id(&self) -> &str {
        self.docno.as_deref().unwrap_or(&self.url)
    }
}

/// A snapshot loaded from disk
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub dir: PathBuf,
    pub manifest: SnapshotManifest,
    /// Documents in fetch order
    pub documents: Vec<SnapshotDocument>,
}

impl Snapshot {
    pub fn open(dir: &Path) -> SnapshotResult<Self> {
        let manifest_path = dir.join(MANIFEST_FILE);
        if !manifest_path.exists() {
            return Err(SnapshotError::NotFound(dir.display().to_string()));
        }
        let manifest = SnapshotManifest::load(&manifest_path)?;

        let conn = Connection::open_with_flags(
            dir.join(DATABASE_FILE),
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        let mut stmt = conn.prepare(
            "SELECT rank, url, host, docno, content_hash, outlink_count, inlink_count,
                    depth, parent, oracle_score, http_status
             FROM documents ORDER BY rank",
        )?;
        let documents = stmt
            .query_map([], |row| {
                Ok(SnapshotDocument {
                    rank: row.get::<_, i64>(0)? as u64,
                    url: row.get(1)?,
                    host: row.get(2)?,
                    docno: row.get(3)?,
                    content_hash: row.get(4)?,
                    outlink_count: row.get(5)?,
                    inlink_count: row.get(6)?,
                    depth: row.get(7)?,
                    parent: row.get(8)?,
                    oracle_score: row.get(9)?,
                    http_status: row.get(10)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            dir: dir.to_path_buf(),
            manifest,
            documents,
        })
    }

    pub fn label(&self) -> SnapshotResult<SnapshotLabel> {
        self.manifest.parsed_label()
    }

    pub fn page_count(&self) -> usize {
        self.documents.len()
    }

    /// Document identifiers in fetch order
    pub fn doc_ids(&self) -> impl Iterator<Item = &str> {
        self.documents.iter().map(|d| d.doc_id())
    }
}

/// Lists the labeled snapshots of an experiment, limits ascending, `final` last
///
/// A missing experiment directory yields an empty list. Directories that are
/// not complete snapshots (no manifest, hidden temp dirs, unknown labels) are
/// ignored.
pub fn list_snapshots(exp_dir: &Path) -> SnapshotResult<Vec<(SnapshotLabel, PathBuf)>> {
    if !exp_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut snapshots = Vec::new();
    for entry in std::fs::read_dir(exp_dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_dir() || !path.join(MANIFEST_FILE).exists() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if let Ok(label) = name.parse::<SnapshotLabel>() {
            snapshots.push((label, path));
        }
    }
    snapshots.sort();
    Ok(snapshots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FrontierType;
    use crate::registry::{FetchStatus, UrlRecord};
    use crate::snapshot::{SnapshotRequest, SnapshotWriter, SqliteSnapshotWriter};
    use crate::url::canonicalize;
    use tempfile::TempDir;

    fn write(writer: &SqliteSnapshotWriter, label: SnapshotLabel, urls: &[&str]) {
        let records = urls
            .iter()
            .enumerate()
            .map(|(i, url)| {
                let parent = if i == 0 {
                    None
                } else {
                    Some(canonicalize(urls[0]).unwrap())
                };
                let mut r = UrlRecord::new(i as u64, canonicalize(url).unwrap(), parent, i as u32);
                r.status = FetchStatus::Fetched;
                r.docno = if i == 0 { Some("D0".to_string()) } else { None };
                r.oracle_score = Some(0.5);
                r.http_status = Some(200);
                r
            })
            .collect();
        writer
            .write(SnapshotRequest {
                label,
                exp_name: "exp".to_string(),
                frontier_type: FrontierType::OracleQuality,
                config_hash: Some("h".to_string()),
                records,
            })
            .unwrap();
    }

    #[test]
    fn test_open_reads_documents_in_fetch_order() {
        let dir = TempDir::new().unwrap();
        let writer = SqliteSnapshotWriter::new(dir.path());
        write(&writer, SnapshotLabel::Final, &["http://a.example/", "http://a.example/x"]);

        let snapshot = Snapshot::open(&dir.path().join("final")).unwrap();
        assert_eq!(snapshot.label().unwrap(), SnapshotLabel::Final);
        assert_eq!(snapshot.page_count(), 2);
        assert_eq!(snapshot.manifest.frontier_type, "oracle-quality");
        assert_eq!(snapshot.manifest.config_hash.as_deref(), Some("h"));

        let second = &snapshot.documents[1];
        assert_eq!(second.rank, 2);
        assert_eq!(second.host, "a.example");
        assert_eq!(second.depth, 1);
        assert_eq!(second.parent.as_deref(), Some("http://a.example/"));
        assert_eq!(second.oracle_score, Some(0.5));
        assert_eq!(second.http_status, Some(200));

        let ids: Vec<&str> = snapshot.doc_ids().collect();
        assert_eq!(ids, vec!["D0", "http://a.example/x"]);
    }

    #[test]
    fn test_open_missing_snapshot() {
        let dir = TempDir::new().unwrap();
        let result = Snapshot::open(&dir.path().join("limit_10"));
        assert!(matches!(result, Err(SnapshotError::NotFound(_))));
    }

    #[test]
    fn test_list_snapshots_sorted() {
        let dir = TempDir::new().unwrap();
        let writer = SqliteSnapshotWriter::new(dir.path());
        write(&writer, SnapshotLabel::Final, &["http://a.example/"]);
        write(&writer, SnapshotLabel::Limit(20), &["http://a.example/"]);
        write(&writer, SnapshotLabel::Limit(10), &["http://a.example/"]);
        std::fs::create_dir(dir.path().join(".tmp-limit_30")).unwrap();
        std::fs::write(dir.path().join("seeds.txt"), "http://a.example/\n").unwrap();

        let labels: Vec<SnapshotLabel> = list_snapshots(dir.path())
            .unwrap()
            .into_iter()
            .map(|(label, _)| label)
            .collect();
        assert_eq!(
            labels,
            vec![
                SnapshotLabel::Limit(10),
                SnapshotLabel::Limit(20),
                SnapshotLabel::Final
            ]
        );
    }

    #[test]
    fn test_list_snapshots_missing_dir() {
        let dir = TempDir::new().unwrap();
        assert!(list_snapshots(&dir.path().join("nope")).unwrap().is_empty());
    }
}
