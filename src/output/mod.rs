//! Output module for crawl reports and snapshot statistics

pub mod stats;

pub use stats::{
    load_statistics, print_report, print_snapshot_list, print_statistics, SnapshotStatistics,
};
