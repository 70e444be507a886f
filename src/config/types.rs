use crate::ConfigError;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Main configuration structure for qcrawl
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub experiment: ExperimentConfig,
    #[serde(default)]
    pub seeds: SeedsConfig,
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub oracle: Option<OracleConfig>,
    #[serde(default)]
    pub snapshot: SnapshotConfig,
    #[serde(default, rename = "benchmark")]
    pub benchmarks: Vec<BenchmarkEntry>,
}

impl Config {
    /// Directory holding every snapshot of this experiment
    pub fn experiment_dir(&self) -> PathBuf {
        self.snapshot.root.join(&self.experiment.name)
    }

    /// Looks up a `[[benchmark]]` entry by name
    pub fn benchmark(&self, name: &str) -> Option<&BenchmarkEntry> {
        self.benchmarks.iter().find(|b| b.name == name)
    }
}

/// Frontier strategy selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum FrontierType {
    /// FIFO by discovery sequence
    Bfs,
    /// LIFO by discovery sequence
    Dfs,
    /// Descending oracle score, ties by discovery sequence
    OracleQuality,
    /// Seeded uniform random selection
    Random,
}

impl FrontierType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FrontierType::Bfs => "bfs",
            FrontierType::Dfs => "dfs",
            FrontierType::OracleQuality => "oracle-quality",
            FrontierType::Random => "random",
        }
    }

    /// Returns all frontier types
    pub fn all() -> &'static [FrontierType] {
        &[
            FrontierType::Bfs,
            FrontierType::Dfs,
            FrontierType::OracleQuality,
            FrontierType::Random,
        ]
    }
}

impl FromStr for FrontierType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bfs" => Ok(FrontierType::Bfs),
            "dfs" => Ok(FrontierType::Dfs),
            "oracle-quality" | "oracle_quality" => Ok(FrontierType::OracleQuality),
            "random" => Ok(FrontierType::Random),
            _ => Err(ConfigError::UnknownFrontierType(s.to_string())),
        }
    }
}

impl TryFrom<String> for FrontierType {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for FrontierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Page budget; `-1` crawls until the frontier is exhausted
    #[serde(rename = "max-pages")]
    pub max_pages: i64,

    #[serde(rename = "frontier-type")]
    pub frontier_type: FrontierType,

    /// Number of concurrent fetch workers
    #[serde(rename = "workers", default = "default_workers")]
    pub workers: u32,

    /// Minimum time between fetches to the same host (milliseconds)
    #[serde(rename = "politeness-interval-ms", default)]
    pub politeness_interval_ms: u64,

    #[serde(rename = "fetch-timeout-ms", default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    /// Wall-clock limit after which the crawl is stopped
    #[serde(rename = "max-duration-secs", default)]
    pub max_duration_secs: Option<u64>,

    /// How long in-flight fetches may finish after a stop before being aborted
    #[serde(rename = "shutdown-grace-ms", default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,

    #[serde(rename = "random-seed", default = "default_random_seed")]
    pub random_seed: u64,

    /// Emit a progress line every N successful fetches
    #[serde(rename = "progress-every", default = "default_progress_every")]
    pub progress_every: u64,
}

fn default_workers() -> u32 {
    1
}

fn default_fetch_timeout_ms() -> u64 {
    30_000
}

fn default_shutdown_grace_ms() -> u64 {
    5_000
}

fn default_random_seed() -> u64 {
    42
}

fn default_progress_every() -> u64 {
    100
}

/// Experiment identification
#[derive(Debug, Clone, Deserialize)]
pub struct ExperimentConfig {
    /// Namespace for snapshots; must be usable as a directory name
    pub name: String,
}

/// How seed URLs are chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedStrategy {
    #[default]
    List,
    Random,
}

/// Seed configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedsConfig {
    #[serde(default)]
    pub strategy: SeedStrategy,

    #[serde(default)]
    pub urls: Vec<String>,

    /// File with one URL per line; `#` starts a comment
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Sample size for the random strategy
    #[serde(default)]
    pub count: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetcherKind {
    /// Simulated crawl over a JSON-lines corpus
    Corpus,
    /// Live HTTP
    Http,
}

/// Fetcher configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    pub kind: FetcherKind,

    #[serde(rename = "corpus-path", default)]
    pub corpus_path: Option<PathBuf>,

    #[serde(rename = "user-agent", default)]
    pub user_agent: Option<UserAgentConfig>,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the `User-Agent` header value
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OracleBackendKind {
    /// Ground-truth score table
    Table,
    /// URL and anchor heuristic
    Heuristic,
}

/// Quality oracle configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OracleConfig {
    pub backend: OracleBackendKind,

    /// TSV of `url<TAB>score`; the corpus `quality` column is used when absent
    #[serde(rename = "scores-path", default)]
    pub scores_path: Option<PathBuf>,

    /// Score used when the backend fails
    #[serde(rename = "default-score", default)]
    pub default_score: f64,

    /// Score given to seeds instead of an oracle call
    #[serde(rename = "seed-score", default = "default_seed_score")]
    pub seed_score: f64,

    /// Blend incoming-edge counts into heuristic scores
    #[serde(rename = "use-inlinks", default)]
    pub use_inlinks: bool,
}

fn default_seed_score() -> f64 {
    1.0
}

/// Snapshot output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotConfig {
    #[serde(default = "default_snapshot_root")]
    pub root: PathBuf,

    /// Periodic checkpoint interval in fetched pages
    #[serde(rename = "every-n-pages", default)]
    pub every_n_pages: Option<u64>,

    /// Explicit checkpoint page counts
    #[serde(default)]
    pub limits: Vec<u64>,

    /// Keep page content in an experiment-wide content store
    #[serde(rename = "store-content", default)]
    pub store_content: bool,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            root: default_snapshot_root(),
            every_n_pages: None,
            limits: Vec::new(),
            store_content: false,
        }
    }
}

fn default_snapshot_root() -> PathBuf {
    PathBuf::from("./crawls")
}

/// Query set used by downstream evaluation
#[derive(Debug, Clone, Deserialize)]
pub struct BenchmarkEntry {
    pub name: String,
    pub queries: PathBuf,
    pub qrels: PathBuf,
}

/// Command-line values that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub max_pages: Option<i64>,
    pub frontier_type: Option<FrontierType>,
    pub exp_name: Option<String>,
    pub workers: Option<u32>,
}

impl ConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.max_pages.is_none()
            && self.frontier_type.is_none()
            && self.exp_name.is_none()
            && self.workers.is_none()
    }
}
