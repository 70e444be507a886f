//! qcrawl main entry point
//!
//! This is the command-line interface for the qcrawl crawl scheduler.

use anyhow::{bail, Context};
use clap::{ArgAction, Args, Parser, Subcommand};
use qcrawl::config::{apply_overrides, load_config_with_hash, Config, ConfigOverrides};
use qcrawl::crawler::{run_crawl, stop_on_ctrl_c, StopHandle};
use qcrawl::output::{load_statistics, print_report, print_snapshot_list, print_statistics};
use qcrawl::snapshot::{
    list_snapshots, plan_index, write_index_plan, IndexRequest, Snapshot, ALL_BENCHMARKS,
};
use qcrawl::FrontierType;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// qcrawl: budgeted crawling with interchangeable frontier strategies
///
/// Crawls a corpus (or the live web) under a page budget with a BFS, DFS,
/// quality-oracle or random frontier, writing snapshots at page-count
/// checkpoints for downstream indexing and evaluation.
#[derive(Parser, Debug)]
#[command(name = "qcrawl")]
#[command(version)]
#[command(about = "Budgeted crawl frontier and scheduling engine", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Set logging verbosity explicitly (0-3)
    #[arg(long, value_name = "N", global = true, conflicts_with = "verbose")]
    verbosity: Option<u8>,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with_all = ["verbose", "verbosity"])]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a crawl and write its snapshots
    Crawl(CrawlArgs),
    /// Resolve the snapshots to index and write the index plan
    Index(IndexArgs),
    /// Show statistics of a stored snapshot
    Stats(StatsArgs),
}

#[derive(Args, Debug)]
struct CrawlArgs {
    /// Path to TOML configuration file
    #[arg(long, short, value_name = "CONFIG")]
    config: PathBuf,

    /// Page budget; -1 crawls until the frontier is exhausted
    #[arg(long, allow_negative_numbers = true)]
    max_pages: Option<i64>,

    /// Frontier strategy: bfs, dfs, oracle-quality or random
    #[arg(long)]
    frontier_type: Option<FrontierType>,

    /// Experiment name; snapshots go to <root>/<exp-name>/
    #[arg(long)]
    exp_name: Option<String>,

    /// Concurrent fetch workers
    #[arg(long)]
    workers: Option<u32>,

    /// Validate the configuration and show what would be crawled
    #[arg(long)]
    dry_run: bool,
}

#[derive(Args, Debug)]
struct IndexArgs {
    /// Path to TOML configuration file
    #[arg(long, short, value_name = "CONFIG")]
    config: PathBuf,

    /// Experiment name (defaults to the configured one)
    #[arg(long)]
    exp_name: Option<String>,

    /// Page-count ceiling of the snapshot to index; the period in periodic mode
    #[arg(long)]
    limit: Option<u64>,

    /// Index every multiple of the period
    #[arg(long)]
    periodic: bool,

    /// Benchmark name, or "all"
    #[arg(long, default_value = ALL_BENCHMARKS)]
    benchmark: String,

    /// Compute evaluation metrics (requires qrels)
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    evaluate: bool,
}

#[derive(Args, Debug)]
struct StatsArgs {
    /// Path to TOML configuration file
    #[arg(long, short, value_name = "CONFIG")]
    config: PathBuf,

    /// Experiment name (defaults to the configured one)
    #[arg(long)]
    exp_name: Option<String>,

    /// Snapshot label, e.g. final or limit_1000
    #[arg(long, default_value = "final")]
    label: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbosity.unwrap_or(cli.verbose), cli.quiet);

    let result = match cli.command {
        Command::Crawl(args) => handle_crawl(args).await,
        Command::Index(args) => handle_index(args),
        Command::Stats(args) => handle_stats(args),
    };

    if let Err(ref e) = result {
        tracing::error!("{:#}", e);
    }
    result
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("qcrawl=info,warn"),
            1 => EnvFilter::new("qcrawl=debug,info"),
            2 => EnvFilter::new("qcrawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the configuration, applies overrides and logs its hash
fn load(path: &Path, overrides: &ConfigOverrides) -> anyhow::Result<(Config, String)> {
    tracing::info!("Loading configuration from: {}", path.display());
    let (mut config, hash) = load_config_with_hash(path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    apply_overrides(&mut config, overrides).context("invalid command-line override")?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok((config, hash))
}

async fn handle_crawl(args: CrawlArgs) -> anyhow::Result<()> {
    let overrides = ConfigOverrides {
        max_pages: args.max_pages,
        frontier_type: args.frontier_type,
        exp_name: args.exp_name,
        workers: args.workers,
    };
    let (config, hash) = load(&args.config, &overrides)?;

    if args.dry_run {
        print_dry_run(&config);
        return Ok(());
    }

    let stop = StopHandle::new();
    stop_on_ctrl_c(stop.clone());

    let report = run_crawl(&config, Some(hash), Some(stop)).await?;
    print_report(&report);
    Ok(())
}

/// Validates config and shows what would be crawled
fn print_dry_run(config: &Config) {
    println!("=== qcrawl Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Frontier: {}", config.crawler.frontier_type);
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Workers: {}", config.crawler.workers);
    println!(
        "  Politeness interval: {}ms",
        config.crawler.politeness_interval_ms
    );
    println!("  Fetch timeout: {}ms", config.crawler.fetch_timeout_ms);

    println!("\nFetcher: {:?}", config.fetcher.kind);
    if let Some(ref path) = config.fetcher.corpus_path {
        println!("  Corpus: {}", path.display());
    }
    if let Some(ref ua) = config.fetcher.user_agent {
        println!("  User agent: {}", ua.header_value());
    }

    if let Some(ref oracle) = config.oracle {
        println!("\nOracle: {:?}", oracle.backend);
        println!("  Default score: {}", oracle.default_score);
        println!("  Seed score: {}", oracle.seed_score);
    }

    println!("\nSeeds ({:?}):", config.seeds.strategy);
    for url in &config.seeds.urls {
        println!("  - {}", url);
    }
    if let Some(ref file) = config.seeds.file {
        println!("  + file {}", file.display());
    }
    if let Some(count) = config.seeds.count {
        println!("  + {} sampled from the corpus", count);
    }

    println!("\nSnapshots: {}", config.experiment_dir().display());
    if let Some(every) = config.snapshot.every_n_pages {
        println!("  Every {} pages", every);
    }
    if !config.snapshot.limits.is_empty() {
        println!("  At {:?} pages", config.snapshot.limits);
    }

    println!("\n✓ Configuration is valid");
}

fn handle_index(args: IndexArgs) -> anyhow::Result<()> {
    let overrides = ConfigOverrides {
        exp_name: args.exp_name,
        ..Default::default()
    };
    let (config, _) = load(&args.config, &overrides)?;

    let exp_dir = config.experiment_dir();
    let request = IndexRequest {
        exp_dir: exp_dir.clone(),
        exp_name: config.experiment.name.clone(),
        periodic: args.periodic,
        limit: args.limit,
        default_period: config.snapshot.every_n_pages,
        benchmark: args.benchmark,
        evaluate: args.evaluate,
    };

    let plan = plan_index(&request, &config.benchmarks)?;
    let plan_path = write_index_plan(&plan, &exp_dir)?;

    println!("=== Index Plan ({}) ===\n", plan.exp_name);
    for snapshot in &plan.snapshots {
        println!("  {}: {} pages", snapshot.label, snapshot.page_count);
    }
    for benchmark in &plan.benchmarks {
        println!("  benchmark {}", benchmark.name);
    }
    println!("\n✓ Plan written to: {}", plan_path.display());
    Ok(())
}

fn handle_stats(args: StatsArgs) -> anyhow::Result<()> {
    let overrides = ConfigOverrides {
        exp_name: args.exp_name,
        ..Default::default()
    };
    let (config, _) = load(&args.config, &overrides)?;

    let exp_dir = config.experiment_dir();
    let snapshots = list_snapshots(&exp_dir)?;
    if snapshots.is_empty() {
        bail!("no snapshots found in {}", exp_dir.display());
    }

    let snapshot = Snapshot::open(&exp_dir.join(&args.label))
        .with_context(|| format!("failed to open snapshot '{}'", args.label))?;
    print_statistics(&load_statistics(&snapshot));
    print_snapshot_list(&snapshots);
    Ok(())
}
