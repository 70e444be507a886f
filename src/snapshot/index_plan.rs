//! Resolving which snapshots the downstream indexer processes
//!
//! Indexing and evaluation are external. This module decides which snapshots
//! an `index` invocation refers to, validates the benchmark selection, and
//! writes a plan plus one docno list per snapshot under `<exp>/index/`.

use crate::config::BenchmarkEntry;
use crate::snapshot::{
    list_snapshots, Snapshot, SnapshotError, SnapshotLabel, SnapshotResult, DOCNOS_FILE,
};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const INDEX_DIR: &str = "index";
pub const INDEX_PLAN_FILE: &str = "index_plan.toml";

/// Benchmark selector meaning every configured benchmark
pub const ALL_BENCHMARKS: &str = "all";

/// Arguments of an `index` invocation
#[derive(Debug, Clone)]
pub struct IndexRequest {
    pub exp_dir: PathBuf,
    pub exp_name: String,
    /// Index every `period`-page snapshot instead of a single one
    pub periodic: bool,
    /// Page-count ceiling; in periodic mode this is the period
    pub limit: Option<u64>,
    /// Period used when `periodic` is set and no limit is given
    pub default_period: Option<u64>,
    /// A benchmark name or `"all"`
    pub benchmark: String,
    pub evaluate: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PlannedSnapshot {
    pub label: String,
    pub dir: PathBuf,
    pub page_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PlannedBenchmark {
    pub name: String,
    pub queries: PathBuf,
    /// Present only when evaluating
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qrels: Option<PathBuf>,
}

/// Contents of `index_plan.toml`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct IndexPlan {
    pub exp_name: String,
    pub evaluate: bool,
    #[serde(rename = "snapshot")]
    pub snapshots: Vec<PlannedSnapshot>,
    #[serde(rename = "benchmark")]
    pub benchmarks: Vec<PlannedBenchmark>,
}

/// Resolves the snapshots and benchmarks an index request covers
///
/// Periodic mode walks `limit_<period>`, `limit_<2·period>`, ... and stops at
/// the first missing one. Otherwise the request names exactly one snapshot:
/// `limit_<N>`, or `final` when no limit is given.
pub fn plan_index(request: &IndexRequest, benchmarks: &[BenchmarkEntry]) -> SnapshotResult<IndexPlan> {
    let labels = resolve_labels(request)?;

    let mut snapshots = Vec::with_capacity(labels.len());
    for (label, dir) in labels {
        let snapshot = Snapshot::open(&dir)?;
        snapshots.push(PlannedSnapshot {
            label: label.to_string(),
            dir,
            page_count: snapshot.page_count(),
        });
    }

    Ok(IndexPlan {
        exp_name: request.exp_name.clone(),
        evaluate: request.evaluate,
        snapshots,
        benchmarks: resolve_benchmarks(request, benchmarks)?,
    })
}

fn resolve_labels(request: &IndexRequest) -> SnapshotResult<Vec<(SnapshotLabel, PathBuf)>> {
    let available = list_snapshots(&request.exp_dir)?;
    let find = |label: SnapshotLabel| {
        available
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, dir)| (label, dir.clone()))
    };

    if request.periodic {
        let period = request.limit.or(request.default_period).ok_or_else(|| {
            SnapshotError::InvalidRequest(
                "periodic indexing needs --limit or snapshot.every-n-pages".to_string(),
            )
        })?;
        if period == 0 {
            return Err(SnapshotError::InvalidRequest(
                "period must be at least 1".to_string(),
            ));
        }

        let mut resolved = Vec::new();
        let mut limit = period;
        while let Some(found) = find(SnapshotLabel::Limit(limit)) {
            resolved.push(found);
            limit += period;
        }
        if resolved.is_empty() {
            return Err(SnapshotError::NotFound(format!(
                "{}/{}",
                request.exp_dir.display(),
                SnapshotLabel::Limit(period)
            )));
        }
        return Ok(resolved);
    }

    let label = request
        .limit
        .map(SnapshotLabel::Limit)
        .unwrap_or(SnapshotLabel::Final);
    find(label).map(|found| vec![found]).ok_or_else(|| {
        SnapshotError::NotFound(format!("{}/{}", request.exp_dir.display(), label))
    })
}

fn resolve_benchmarks(
    request: &IndexRequest,
    benchmarks: &[BenchmarkEntry],
) -> SnapshotResult<Vec<PlannedBenchmark>> {
    let selected: Vec<&BenchmarkEntry> = if request.benchmark == ALL_BENCHMARKS {
        benchmarks.iter().collect()
    } else {
        let entry = benchmarks
            .iter()
            .find(|b| b.name == request.benchmark)
            .ok_or_else(|| {
                SnapshotError::InvalidRequest(format!(
                    "unknown benchmark '{}' (configured: {})",
                    request.benchmark,
                    benchmarks
                        .iter()
                        .map(|b| b.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })?;
        vec![entry]
    };

    if request.evaluate && selected.is_empty() {
        return Err(SnapshotError::InvalidRequest(
            "evaluation requested but no benchmark is configured".to_string(),
        ));
    }

    selected
        .into_iter()
        .map(|b| {
            if !b.queries.exists() {
                return Err(SnapshotError::InvalidRequest(format!(
                    "queries file for '{}' not found: {}",
                    b.name,
                    b.queries.display()
                )));
            }
            if request.evaluate && !b.qrels.exists() {
                return Err(SnapshotError::InvalidRequest(format!(
                    "qrels file for '{}' not found: {}",
                    b.name,
                    b.qrels.display()
                )));
            }
            Ok(PlannedBenchmark {
                name: b.name.clone(),
                queries: b.queries.clone(),
                qrels: request.evaluate.then(|| b.qrels.clone()),
            })
        })
        .collect()
}

/// Writes `<exp>/index/<label>/docnos.txt` per snapshot and the plan file
///
/// Returns the path of `index_plan.toml`.
pub fn write_index_plan(plan: &IndexPlan, exp_dir: &Path) -> SnapshotResult<PathBuf> {
    let index_dir = exp_dir.join(INDEX_DIR);

    for planned in &plan.snapshots {
        let snapshot = Snapshot::open(&planned.dir)?;
        let out_dir = index_dir.join(&planned.label);
        std::fs::create_dir_all(&out_dir)?;

        let mut file = std::io::BufWriter::new(std::fs::File::create(out_dir.join(DOCNOS_FILE))?);
        for doc_id in snapshot.doc_ids() {
            writeln!(file, "{}", doc_id)?;
        }
        file.flush()?;

        tracing::debug!(
            "Wrote {} docnos for {}",
            snapshot.page_count(),
            planned.label
        );
    }

    std::fs::create_dir_all(&index_dir)?;
    let plan_path = index_dir.join(INDEX_PLAN_FILE);
    std::fs::write(&plan_path, toml::to_string(plan)?)?;
    Ok(plan_path)
}
