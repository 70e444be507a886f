//! Integration tests for the crawler
//!
//! In-memory link graphs drive the scheduler through each frontier strategy;
//! wiremock serves a small site for the HTTP fetcher; a JSON-lines corpus on
//! disk exercises the full crawl-then-index cycle.

use async_trait::async_trait;
use qcrawl::config::parse_config;
use qcrawl::crawler::{
    read_seed_file, run_crawl, FetchError, FetchedPage, Fetcher, HttpFetcher, Outlink, Scheduler,
    SchedulerSettings, SEEDS_FILE,
};
use qcrawl::oracle::{QualityOracle, TableBackend};
use qcrawl::snapshot::{
    list_snapshots, plan_index, write_index_plan, CheckpointPlan, IndexRequest, Snapshot,
    SnapshotError, SnapshotHandle, SnapshotLabel, SnapshotRequest, SnapshotResult,
    SnapshotWriter, SqliteSnapshotWriter, DOCNOS_FILE,
};
use qcrawl::{canonicalize, CanonicalUrl, CrawlError, CrawlPhase, FetchStatus, FrontierType};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Link graph served from memory, recording when each URL was fetched
#[derive(Default)]
struct GraphFetcher {
    pages: HashMap<String, Vec<String>>,
    delays: HashMap<String, Duration>,
    fetches: Mutex<Vec<(String, Instant)>>,
}

impl GraphFetcher {
    fn new(edges: &[(&str, &[&str])]) -> Self {
        let mut fetcher = Self::default();
        for (url, outlinks) in edges {
            fetcher.pages.insert(
                url.to_string(),
                outlinks.iter().map(|s| s.to_string()).collect(),
            );
        }
        fetcher
    }

    fn with_delay(mut self, url: &str, delay: Duration) -> Self {
        self.delays.insert(url.to_string(), delay);
        self
    }

    fn order(&self) -> Vec<String> {
        self.fetches
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    fn fetch_times(&self) -> Vec<Instant> {
        self.fetches.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }
}

#[async_trait]
impl Fetcher for GraphFetcher {
    async fn fetch(&self, url: &CanonicalUrl) -> Result<FetchedPage, FetchError> {
        self.fetches
            .lock()
            .unwrap()
            .push((url.to_string(), Instant::now()));

        if let Some(delay) = self.delays.get(url.as_str()) {
            tokio::time::sleep(*delay).await;
        }

        let outlinks = self
            .pages
            .get(url.as_str())
            .ok_or_else(|| FetchError::Http { status: 404 })?
            .iter()
            .map(Outlink::new)
            .collect();

        Ok(FetchedPage {
            content: format!("<html><body>{}</body></html>", url),
            outlinks,
            http_status: 200,
            docno: None,
            title: None,
        })
    }
}

const A: &str = "http://a.example/";
const B: &str = "http://b.example/";
const C: &str = "http://c.example/";
const D: &str = "http://d.example/";
const E: &str = "http://e.example/";

/// A -> B, C; B -> D; C -> E
fn tree() -> Arc<GraphFetcher> {
    Arc::new(GraphFetcher::new(&[
        (A, &[B, C]),
        (B, &[D]),
        (C, &[E]),
        (D, &[]),
        (E, &[]),
    ]))
}

fn scheduler(settings: SchedulerSettings, fetcher: Arc<GraphFetcher>) -> Scheduler {
    Scheduler::new(settings, fetcher)
}

fn status_of(scheduler: &Scheduler, url: &str) -> FetchStatus {
    scheduler
        .registry()
        .lookup(&canonicalize(url).unwrap())
        .map(|r| r.status)
        .expect("URL should be registered")
}

#[tokio::test]
async fn test_bfs_crawl_order() {
    let fetcher = tree();
    let mut s = scheduler(SchedulerSettings::new(-1, FrontierType::Bfs), fetcher.clone());
    s.seed(&[A]).unwrap();

    let report = s.run().await.unwrap();

    assert_eq!(fetcher.order(), vec![A, B, C, D, E]);
    assert_eq!(report.reason, CrawlPhase::FrontierExhausted);
    assert_eq!(report.pages_fetched, 5);
    assert_eq!(s.phase(), CrawlPhase::Terminated);
}

#[tokio::test]
async fn test_dfs_crawl_order() {
    let fetcher = tree();
    let mut s = scheduler(SchedulerSettings::new(-1, FrontierType::Dfs), fetcher.clone());
    s.seed(&[A]).unwrap();

    s.run().await.unwrap();

    // Last discovered first: C before B, and C's subtree before B's
    assert_eq!(fetcher.order(), vec![A, C, E, B, D]);
}

#[tokio::test]
async fn test_oracle_crawl_prefers_high_scores() {
    let fetcher = Arc::new(GraphFetcher::new(&[(A, &[B, C, D]), (B, &[]), (C, &[]), (D, &[])]));
    let table = TableBackend::from_scores([(B, 0.2), (C, 0.9), (D, 0.5)]);
    let oracle = QualityOracle::new(Arc::new(table), 0.0);

    let mut s = scheduler(
        SchedulerSettings::new(-1, FrontierType::OracleQuality),
        fetcher.clone(),
    )
    .with_oracle(oracle);
    s.seed(&[A]).unwrap();

    let report = s.run().await.unwrap();

    assert_eq!(fetcher.order(), vec![A, C, D, B]);
    assert_eq!(report.counters.oracle_fallbacks, 0);
    let c = s.registry().lookup(&canonicalize(C).unwrap()).unwrap();
    assert_eq!(c.oracle_score, Some(0.9));
}

#[tokio::test]
async fn test_oracle_missing_scores_fall_back_to_default() {
    let fetcher = Arc::new(GraphFetcher::new(&[(A, &[B, C]), (B, &[]), (C, &[])]));
    let table = TableBackend::from_scores([(B, 0.1)]);
    let oracle = QualityOracle::new(Arc::new(table), 0.5);

    let mut s = scheduler(
        SchedulerSettings::new(-1, FrontierType::OracleQuality),
        fetcher.clone(),
    )
    .with_oracle(oracle);
    s.seed(&[A]).unwrap();

    let report = s.run().await.unwrap();

    // C has no table entry and gets the default 0.5, above B's 0.1
    assert_eq!(fetcher.order(), vec![A, C, B]);
    assert_eq!(report.counters.oracle_fallbacks, 1);
}

#[tokio::test]
async fn test_budget_stops_crawl() {
    let fetcher = tree();
    let mut s = scheduler(SchedulerSettings::new(2, FrontierType::Bfs), fetcher.clone());
    s.seed(&[A]).unwrap();

    let report = s.run().await.unwrap();

    assert_eq!(report.reason, CrawlPhase::BudgetExhausted);
    assert_eq!(report.pages_fetched, 2);
    assert_eq!(report.counts.fetched, 2);
    assert_eq!(fetcher.order(), vec![A, B]);
    assert_eq!(status_of(&s, C), FetchStatus::Pending);
    assert_eq!(report.frontier_remaining, 2);
}

#[tokio::test]
async fn test_duplicate_discoveries_fetch_once() {
    let fetcher = Arc::new(GraphFetcher::new(&[
        (A, &[B, C]),
        (B, &[C, D, A]),
        (C, &[B, D]),
        (D, &[A, B, C]),
    ]));
    let mut settings = SchedulerSettings::new(-1, FrontierType::Bfs);
    settings.workers = 3;
    let mut s = scheduler(settings, fetcher.clone());
    s.seed(&[A, A]).unwrap();

    let report = s.run().await.unwrap();

    let order = fetcher.order();
    let unique: HashSet<&String> = order.iter().collect();
    assert_eq!(order.len(), 4);
    assert_eq!(unique.len(), 4);
    assert_eq!(report.counts.total(), 4);

    let d = s.registry().lookup(&canonicalize(D).unwrap()).unwrap();
    assert_eq!(d.inlink_count, 2);
    assert_eq!(d.depth, 2);
    assert_eq!(d.parent.as_ref().map(|p| p.as_str()), Some(B));
}

#[tokio::test]
async fn test_politeness_interval_between_same_host_fetches() {
    let pages = [
        "http://a.example/1",
        "http://a.example/2",
        "http://a.example/3",
    ];
    let fetcher = Arc::new(GraphFetcher::new(&[
        (pages[0], &[pages[1], pages[2]]),
        (pages[1], &[]),
        (pages[2], &[]),
    ]));

    let interval = Duration::from_millis(100);
    let mut settings = SchedulerSettings::new(-1, FrontierType::Bfs);
    settings.workers = 4;
    settings.politeness_interval = interval;
    let mut s = scheduler(settings, fetcher.clone());
    s.seed(&[pages[0]]).unwrap();

    let report = s.run().await.unwrap();
    assert_eq!(report.pages_fetched, 3);
    assert!(report.counters.deferrals > 0);

    let times = fetcher.fetch_times();
    for pair in times.windows(2) {
        let gap = pair[1].duration_since(pair[0]);
        // Fetch starts trail dispatch by task spawn latency only
        assert!(
            gap >= interval - Duration::from_millis(10),
            "same-host fetches {:?} apart",
            gap
        );
    }
}

#[tokio::test]
async fn test_politeness_does_not_delay_other_hosts() {
    let fetcher = Arc::new(GraphFetcher::new(&[
        (A, &["http://a.example/x", B]),
        ("http://a.example/x", &[]),
        (B, &[]),
    ]));

    let mut settings = SchedulerSettings::new(-1, FrontierType::Bfs);
    settings.politeness_interval = Duration::from_millis(300);
    let mut s = scheduler(settings, fetcher.clone());
    s.seed(&[A]).unwrap();

    s.run().await.unwrap();

    // a.example/x waits out the interval; b.example goes first
    assert_eq!(fetcher.order(), vec![A, B, "http://a.example/x"]);
}

const HA: &str = "http://h.example/a";
const HB: &str = "http://h.example/b";
const HC: &str = "http://h.example/c";
const HE: &str = "http://h.example/e";

/// Crawls a single-host graph with one worker and returns the fetch order
async fn single_host_crawl(
    frontier_type: FrontierType,
    interval: Duration,
    oracle: Option<QualityOracle>,
) -> Vec<String> {
    // a -> b, c; c -> e
    let fetcher = Arc::new(GraphFetcher::new(&[
        (HA, &[HB, HC]),
        (HB, &[]),
        (HC, &[HE]),
        (HE, &[]),
    ]));
    let mut settings = SchedulerSettings::new(-1, frontier_type);
    settings.politeness_interval = interval;
    let mut s = scheduler(settings, fetcher.clone());
    if let Some(oracle) = oracle {
        s = s.with_oracle(oracle);
    }
    s.seed(&[HA]).unwrap();

    s.run().await.unwrap();
    fetcher.order()
}

#[tokio::test]
async fn test_politeness_keeps_dfs_order_within_host() {
    let immediate = single_host_crawl(FrontierType::Dfs, Duration::ZERO, None).await;
    let polite = single_host_crawl(FrontierType::Dfs, Duration::from_millis(30), None).await;

    assert_eq!(immediate, vec![HA, HC, HE, HB]);
    assert_eq!(polite, immediate);
}

#[tokio::test]
async fn test_politeness_keeps_oracle_order_within_host() {
    let oracle = || {
        let table = TableBackend::from_scores([(HB, 0.1), (HC, 0.5), (HE, 0.99)]);
        Some(QualityOracle::new(Arc::new(table), 0.0))
    };
    let immediate = single_host_crawl(FrontierType::OracleQuality, Duration::ZERO, oracle()).await;
    let polite = single_host_crawl(
        FrontierType::OracleQuality,
        Duration::from_millis(30),
        oracle(),
    )
    .await;

    assert_eq!(immediate, vec![HA, HC, HE, HB]);
    assert_eq!(polite, immediate);
}

#[tokio::test]
async fn test_many_workers_no_duplicate_fetches() {
    let urls: Vec<String> = (0..30)
        .map(|i| format!("http://h{}.example/p{}", i % 6, i))
        .collect();
    let mut fetcher = GraphFetcher::default();
    for (i, url) in urls.iter().enumerate() {
        let outlinks = (1..=4).map(|k| urls[(i * 7 + k * 3) % urls.len()].clone()).collect();
        fetcher.pages.insert(url.clone(), outlinks);
        fetcher
            .delays
            .insert(url.clone(), Duration::from_millis((i % 3) as u64));
    }
    let fetcher = Arc::new(fetcher);

    let mut settings = SchedulerSettings::new(-1, FrontierType::Random);
    settings.workers = 8;
    let mut s = scheduler(settings, fetcher.clone());
    s.seed(&[urls[0].as_str()]).unwrap();

    let report = s.run().await.unwrap();

    let order = fetcher.order();
    let unique: HashSet<&String> = order.iter().collect();
    assert_eq!(unique.len(), order.len());
    assert_eq!(report.pages_fetched as usize, order.len());
    assert_eq!(report.counts.fetched as usize, s.registry().len());
}

#[tokio::test]
async fn test_stop_signal_discards_in_flight_fetches() {
    let fetcher = Arc::new(
        GraphFetcher::new(&[(A, &[B]), (B, &[])]).with_delay(B, Duration::from_secs(30)),
    );
    let mut settings = SchedulerSettings::new(-1, FrontierType::Bfs);
    settings.shutdown_grace = Duration::from_millis(50);
    let mut s = scheduler(settings, fetcher.clone());
    s.seed(&[A]).unwrap();

    let stop = s.stop_handle();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        stop.stop();
    });

    let started = Instant::now();
    let report = s.run().await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(report.reason, CrawlPhase::Stopped);
    assert_eq!(report.pages_fetched, 1);
    assert_eq!(report.counters.discarded_results, 1);
    assert_eq!(status_of(&s, A), FetchStatus::Fetched);
    assert_eq!(status_of(&s, B), FetchStatus::Skipped);
}

#[tokio::test]
async fn test_max_duration_stops_crawl() {
    let fetcher = Arc::new(
        GraphFetcher::new(&[(A, &[B]), (B, &[])]).with_delay(B, Duration::from_secs(30)),
    );
    let mut settings = SchedulerSettings::new(-1, FrontierType::Bfs);
    settings.max_duration = Some(Duration::from_millis(200));
    settings.shutdown_grace = Duration::from_millis(10);
    let mut s = scheduler(settings, fetcher);
    s.seed(&[A]).unwrap();

    let report = s.run().await.unwrap();

    assert_eq!(report.reason, CrawlPhase::Stopped);
    assert_eq!(status_of(&s, B), FetchStatus::Skipped);
}

#[tokio::test]
async fn test_checkpoint_snapshots_read_back() {
    let dir = TempDir::new().unwrap();
    let chain = [
        "http://a.example/0",
        "http://a.example/1",
        "http://b.example/2",
        "http://b.example/3",
        "http://c.example/4",
    ];
    let fetcher = Arc::new(GraphFetcher::new(&[
        (chain[0], &[chain[1]]),
        (chain[1], &[chain[2]]),
        (chain[2], &[chain[3]]),
        (chain[3], &[chain[4]]),
        (chain[4], &[]),
    ]));

    let mut settings = SchedulerSettings::new(-1, FrontierType::Bfs);
    settings.checkpoints = CheckpointPlan::new(Some(2), []);
    settings.exp_name = "chain".to_string();
    let mut s = scheduler(settings, fetcher)
        .with_snapshot_writer(Arc::new(SqliteSnapshotWriter::new(dir.path())));
    s.seed(&[chain[0]]).unwrap();

    let report = s.run().await.unwrap();
    assert_eq!(report.counters.snapshots_written, 3);
    assert_eq!(report.counters.snapshots_failed, 0);

    let labels: Vec<SnapshotLabel> = list_snapshots(dir.path())
        .unwrap()
        .into_iter()
        .map(|(label, _)| label)
        .collect();
    assert_eq!(
        labels,
        vec![
            SnapshotLabel::Limit(2),
            SnapshotLabel::Limit(4),
            SnapshotLabel::Final
        ]
    );

    let early = Snapshot::open(&dir.path().join("limit_2")).unwrap();
    assert_eq!(early.page_count(), 2);
    assert_eq!(early.manifest.exp_name, "chain");
    assert_eq!(early.manifest.frontier_type, "bfs");
    let urls: Vec<&str> = early.documents.iter().map(|d| d.url.as_str()).collect();
    assert_eq!(urls, vec![chain[0], chain[1]]);

    let last = Snapshot::open(&dir.path().join("final")).unwrap();
    assert_eq!(last.page_count(), 5);
    assert_eq!(last.documents[4].depth, 4);
    assert_eq!(last.documents[4].parent.as_deref(), Some(chain[3]));
}

/// Writes through to SQLite except for one label, which fails like a full disk
struct FailingOnceWriter {
    inner: SqliteSnapshotWriter,
    fail_on: SnapshotLabel,
}

impl SnapshotWriter for FailingOnceWriter {
    fn write(&self, request: SnapshotRequest) -> SnapshotResult<SnapshotHandle> {
        if request.label == self.fail_on {
            return Err(SnapshotError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "no space left on device",
            )));
        }
        self.inner.write(request)
    }
}

#[tokio::test]
async fn test_failed_checkpoint_does_not_stop_crawl() {
    let dir = TempDir::new().unwrap();
    let chain = [
        "http://a.example/0",
        "http://a.example/1",
        "http://b.example/2",
        "http://b.example/3",
        "http://c.example/4",
    ];
    let fetcher = Arc::new(GraphFetcher::new(&[
        (chain[0], &[chain[1]]),
        (chain[1], &[chain[2]]),
        (chain[2], &[chain[3]]),
        (chain[3], &[chain[4]]),
        (chain[4], &[]),
    ]));

    let mut settings = SchedulerSettings::new(-1, FrontierType::Bfs);
    settings.checkpoints = CheckpointPlan::new(Some(2), []);
    let writer = FailingOnceWriter {
        inner: SqliteSnapshotWriter::new(dir.path()),
        fail_on: SnapshotLabel::Limit(2),
    };
    let mut s = scheduler(settings, fetcher.clone()).with_snapshot_writer(Arc::new(writer));
    s.seed(&[chain[0]]).unwrap();

    let report = s.run().await.unwrap();

    assert_eq!(report.reason, CrawlPhase::FrontierExhausted);
    assert_eq!(report.pages_fetched, 5);
    assert_eq!(fetcher.order(), chain.to_vec());
    assert_eq!(report.counters.snapshots_failed, 1);
    assert_eq!(report.counters.snapshots_written, 2);

    let written: Vec<SnapshotLabel> = report.snapshots.iter().map(|h| h.label).collect();
    assert_eq!(written, vec![SnapshotLabel::Limit(4), SnapshotLabel::Final]);
    assert!(!dir.path().join("limit_2").exists());
    let last = Snapshot::open(&dir.path().join("final")).unwrap();
    assert_eq!(last.page_count(), 5);
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><head><title>T</title></head><body>{}</body></html>", body).into_bytes(),
        "text/html",
    )
}

#[tokio::test]
async fn test_http_crawl_with_mock_server() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<a href="/page1">Page 1</a> <a href="page2#top">Page 2</a> <a href="/missing">Gone</a>"#,
        ))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/page1"))
        .respond_with(html(r#"<a href="/">Home</a> <a href="/page2">Page 2</a>"#))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/page2"))
        .respond_with(html("No links here"))
        .mount(&mock_server)
        .await;

    let fetcher = Arc::new(HttpFetcher::with_client(reqwest::Client::new()));
    let mut s = Scheduler::new(SchedulerSettings::new(-1, FrontierType::Bfs), fetcher);
    s.seed(&[format!("{}/", base_url)]).unwrap();

    let report = s.run().await.unwrap();

    assert_eq!(report.reason, CrawlPhase::FrontierExhausted);
    assert_eq!(report.counts.fetched, 3);
    assert_eq!(report.counts.failed, 1);
    assert_eq!(report.counters.pages_without_outlinks, 1);

    let missing = s
        .registry()
        .lookup(&canonicalize(&format!("{}/missing", base_url)).unwrap())
        .unwrap();
    assert_eq!(missing.status, FetchStatus::Failed);
    assert_eq!(missing.http_status, Some(404));

    let home = s
        .registry()
        .lookup(&canonicalize(&format!("{}/", base_url)).unwrap())
        .unwrap();
    assert_eq!(home.outlink_count, 3);
    assert!(home.content_hash.is_some());
}

#[tokio::test]
async fn test_http_non_html_is_failure() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"{}".to_vec(), "application/json"))
        .mount(&mock_server)
        .await;

    let fetcher = Arc::new(HttpFetcher::with_client(reqwest::Client::new()));
    let mut s = Scheduler::new(SchedulerSettings::new(-1, FrontierType::Bfs), fetcher);
    s.seed(&[format!("{}/data.json", mock_server.uri())]).unwrap();

    let report = s.run().await.unwrap();

    assert_eq!(report.pages_fetched, 0);
    assert_eq!(report.counts.failed, 1);
}

const CORPUS: &str = r#"{"url": "http://a.example/", "docno": "doc-a", "content": "alpha", "outlinks": ["http://b.example/", "http://c.example/", "http://elsewhere.example/"], "quality": 0.9}
{"url": "http://b.example/", "docno": "doc-b", "content": "bravo", "outlinks": ["http://d.example/"], "quality": 0.2}
{"url": "http://c.example/", "docno": "doc-c", "content": "charlie", "outlinks": ["http://d.example/", "http://e.example/"], "quality": 0.7}
{"url": "http://d.example/", "docno": "doc-d", "content": "delta", "quality": 0.4}
{"url": "http://e.example/", "docno": "doc-e", "content": "echo", "quality": 0.6}
"#;

/// Writes a corpus, benchmark files and a config into `dir`
fn write_experiment(dir: &TempDir, frontier: &str) -> String {
    let root = dir.path();
    std::fs::write(root.join("corpus.jsonl"), CORPUS).unwrap();
    std::fs::write(root.join("queries.tsv"), "q1\talpha\n").unwrap();
    std::fs::write(root.join("qrels.txt"), "q1 0 doc-a 1\n").unwrap();

    format!(
        r#"
[crawler]
max-pages = -1
frontier-type = "{frontier}"

[experiment]
name = "corpus-{frontier}"

[seeds]
urls = ["http://a.example/", "not a url", "http://missing.example/"]

[fetcher]
kind = "corpus"
corpus-path = '{root}/corpus.jsonl'

[oracle]
backend = "table"

[snapshot]
root = '{root}/crawls'
every-n-pages = 2
store-content = true

[[benchmark]]
name = "toy"
queries = '{root}/queries.tsv'
qrels = '{root}/qrels.txt'
"#,
        frontier = frontier,
        root = root.display()
    )
}

#[tokio::test]
async fn test_corpus_crawl_and_index_plan() {
    let dir = TempDir::new().unwrap();
    let config = parse_config(&write_experiment(&dir, "oracle-quality")).unwrap();
    let exp_dir = config.experiment_dir();

    let report = run_crawl(&config, Some("abc123".to_string()), None)
        .await
        .unwrap();

    assert_eq!(report.reason, CrawlPhase::FrontierExhausted);
    assert_eq!(report.pages_fetched, 5);
    assert_eq!(report.counters.malformed_seeds, 1);
    assert_eq!(report.counters.missing_seeds, 1);
    assert_eq!(report.counters.unfetchable_outlinks, 1);

    let seeds = read_seed_file(&exp_dir.join(SEEDS_FILE)).unwrap();
    assert_eq!(seeds, vec!["http://a.example/".to_string()]);

    // Corpus quality column drives the order: a, c (0.7), e (0.6), d (0.4), b (0.2)
    let last = Snapshot::open(&exp_dir.join("final")).unwrap();
    assert_eq!(last.manifest.config_hash.as_deref(), Some("abc123"));
    let docnos: Vec<&str> = last.doc_ids().collect();
    assert_eq!(docnos.len(), 5);
    let first_two = Snapshot::open(&exp_dir.join("limit_2")).unwrap();
    let early: Vec<&str> = first_two.doc_ids().collect();
    assert_eq!(early, vec!["doc-a", "doc-c"]);

    let request = IndexRequest {
        exp_dir: exp_dir.clone(),
        exp_name: config.experiment.name.clone(),
        periodic: true,
        limit: None,
        default_period: config.snapshot.every_n_pages,
        benchmark: "all".to_string(),
        evaluate: true,
    };
    let plan = plan_index(&request, &config.benchmarks).unwrap();
    let labels: Vec<&str> = plan.snapshots.iter().map(|p| p.label.as_str()).collect();
    assert_eq!(labels, vec!["limit_2", "limit_4"]);
    assert_eq!(plan.benchmarks.len(), 1);
    assert!(plan.benchmarks[0].qrels.is_some());

    let plan_path = write_index_plan(&plan, &exp_dir).unwrap();
    assert!(plan_path.exists());
    let docnos = std::fs::read_to_string(exp_dir.join("index/limit_2").join(DOCNOS_FILE)).unwrap();
    assert_eq!(docnos, "doc-a\ndoc-c\n");

    // The experiment directory now holds snapshots and is refused
    let err = run_crawl(&config, None, None).await.unwrap_err();
    assert!(matches!(err, CrawlError::Config(_)));
}

#[tokio::test]
async fn test_corpus_crawl_budget_writes_final_snapshot() {
    let dir = TempDir::new().unwrap();
    let mut config = parse_config(&write_experiment(&dir, "bfs")).unwrap();
    config.crawler.max_pages = 3;
    config.snapshot.every_n_pages = None;

    let report = run_crawl(&config, None, None).await.unwrap();

    assert_eq!(report.reason, CrawlPhase::BudgetExhausted);
    assert_eq!(report.snapshots.len(), 1);
    assert_eq!(report.snapshots[0].label, SnapshotLabel::Final);

    let last = Snapshot::open(&config.experiment_dir().join("final")).unwrap();
    let docnos: Vec<&str> = last.doc_ids().collect();
    assert_eq!(docnos, vec!["doc-a", "doc-b", "doc-c"]);
}
