//! Statistics of crawls and stored snapshots
//!
//! This module provides functionality for extracting and displaying
//! statistics from a finished crawl report or a snapshot read back from disk.

use crate::crawler::CrawlReport;
use crate::snapshot::{Snapshot, SnapshotLabel};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

/// Number of hosts listed by [`print_statistics`]
const TOP_HOSTS: usize = 10;

/// Summary of one snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotStatistics {
    pub label: String,
    pub exp_name: String,
    pub frontier_type: String,
    pub created_at: String,

    /// Number of fetched documents
    pub total_pages: u64,

    /// Documents fetched at each depth from the seeds
    pub pages_by_depth: BTreeMap<u32, u64>,

    /// Documents per host, most crawled first
    pub pages_by_host: Vec<(String, u64)>,

    /// Outlinks counted on fetched pages
    pub total_outlinks: u64,

    /// Mean oracle score over documents that have one
    pub mean_oracle_score: Option<f64>,
}

impl SnapshotStatistics {
    pub fn unique_hosts(&self) -> usize {
        self.pages_by_host.len()
    }

    pub fn seed_pages(&self) -> u64 {
        self.pages_by_depth.get(&0).copied().unwrap_or(0)
    }
}

/// Computes statistics of a loaded snapshot
pub fn load_statistics(snapshot: &Snapshot) -> SnapshotStatistics {
    let mut pages_by_depth = BTreeMap::new();
    let mut hosts: HashMap<&str, u64> = HashMap::new();
    let mut total_outlinks = 0u64;
    let mut score_sum = 0.0;
    let mut scored = 0u64;

    for doc in &snapshot.documents {
        *pages_by_depth.entry(doc.depth).or_insert(0) += 1;
        *hosts.entry(doc.host.as_str()).or_insert(0) += 1;
        total_outlinks += u64::from(doc.outlink_count);
        if let Some(score) = doc.oracle_score {
            score_sum += score;
            scored += 1;
        }
    }

    let mut pages_by_host: Vec<(String, u64)> = hosts
        .into_iter()
        .map(|(host, count)| (host.to_string(), count))
        .collect();
    pages_by_host.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    SnapshotStatistics {
        label: snapshot.manifest.label.clone(),
        exp_name: snapshot.manifest.exp_name.clone(),
        frontier_type: snapshot.manifest.frontier_type.clone(),
        created_at: snapshot.manifest.created_at.clone(),
        total_pages: snapshot.documents.len() as u64,
        pages_by_depth,
        pages_by_host,
        total_outlinks,
        mean_oracle_score: (scored > 0).then(|| score_sum / scored as f64),
    }
}

/// Prints snapshot statistics to stdout
pub fn print_statistics(stats: &SnapshotStatistics) {
    println!("=== Snapshot {} ({}) ===\n", stats.label, stats.exp_name);

    println!("Overview:");
    println!("  Frontier: {}", stats.frontier_type);
    println!("  Created: {}", stats.created_at);
    println!("  Pages: {}", stats.total_pages);
    println!("  Seed pages: {}", stats.seed_pages());
    println!("  Unique hosts: {}", stats.unique_hosts());
    println!("  Outlinks on fetched pages: {}", stats.total_outlinks);
    if let Some(mean) = stats.mean_oracle_score {
        println!("  Mean oracle score: {:.3}", mean);
    }
    println!();

    if !stats.pages_by_depth.is_empty() {
        println!("Pages by Depth:");
        for (depth, count) in &stats.pages_by_depth {
            println!("  {}: {} ({:.1}%)", depth, count, percent(*count, stats.total_pages));
        }
        println!();
    }

    if !stats.pages_by_host.is_empty() {
        println!("Top Hosts:");
        for (host, count) in stats.pages_by_host.iter().take(TOP_HOSTS) {
            println!("  {}: {}", host, count);
        }
        println!();
    }
}

/// Prints the final report of a crawl to stdout
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report ===\n");

    println!("Overview:");
    println!("  Ended: {}", report.reason);
    println!(
        "  Duration: {:.1}s ({:.2} pages/sec)",
        report.duration.as_secs_f64(),
        report.pages_per_sec()
    );
    println!("  Pages fetched: {}", report.pages_fetched);
    println!(
        "  Never dispatched: {} in frontier, {} deferred",
        report.frontier_remaining, report.deferred_remaining
    );
    println!();

    let counts = &report.counts;
    println!("URLs by Status:");
    for (name, count) in [
        ("fetched", counts.fetched),
        ("failed", counts.failed),
        ("skipped", counts.skipped),
        ("pending", counts.pending),
    ] {
        println!("  {}: {} ({:.1}%)", name, count, percent(count, counts.total()));
    }
    println!();

    let c = &report.counters;
    println!("Events:");
    println!("  Malformed seeds: {}", c.malformed_seeds);
    println!("  Missing seeds: {}", c.missing_seeds);
    println!("  Malformed outlinks: {}", c.malformed_outlinks);
    println!("  Unfetchable outlinks: {}", c.unfetchable_outlinks);
    println!("  Pages without outlinks: {}", c.pages_without_outlinks);
    println!("  Politeness deferrals: {}", c.deferrals);
    println!("  Oracle fallbacks: {}", c.oracle_fallbacks);
    println!("  Discarded results: {}", c.discarded_results);
    println!();

    println!(
        "Snapshots ({} written, {} failed):",
        c.snapshots_written, c.snapshots_failed
    );
    for handle in &report.snapshots {
        println!(
            "  {}: {} pages -> {}",
            handle.label,
            handle.page_count,
            handle.dir.display()
        );
    }
}

/// Prints the labeled snapshots of an experiment
pub fn print_snapshot_list(snapshots: &[(SnapshotLabel, PathBuf)]) {
    println!("Snapshots ({}):", snapshots.len());
    for (label, dir) in snapshots {
        println!("  - {} ({})", label, dir.display());
    }
}

fn percent(count: u64, total: u64) -> f64 {
    if total > 0 {
        (count as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}
