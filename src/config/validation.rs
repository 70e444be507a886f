use crate::config::types::{
    BenchmarkEntry, Config, CrawlerConfig, ExperimentConfig, FetcherConfig, FetcherKind,
    FrontierType, OracleBackendKind, OracleConfig, SeedStrategy, SeedsConfig, SnapshotConfig,
    UserAgentConfig,
};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_experiment_config(&config.experiment)?;
    validate_fetcher_config(&config.fetcher)?;
    validate_seeds_config(&config.seeds, config.fetcher.kind)?;
    validate_oracle_config(
        config.oracle.as_ref(),
        config.crawler.frontier_type,
        config.fetcher.kind,
    )?;
    validate_snapshot_config(&config.snapshot)?;
    validate_benchmarks(&config.benchmarks)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_pages < -1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be -1 (unbounded) or >= 0, got {}",
            config.max_pages
        )));
    }

    if config.workers < 1 || config.workers > 256 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 256, got {}",
            config.workers
        )));
    }

    if config.fetch_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "fetch_timeout_ms must be > 0".to_string(),
        ));
    }

    if config.progress_every == 0 {
        return Err(ConfigError::Validation(
            "progress_every must be >= 1".to_string(),
        ));
    }

    if config.max_duration_secs == Some(0) {
        return Err(ConfigError::Validation(
            "max_duration_secs must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

fn validate_experiment_config(config: &ExperimentConfig) -> Result<(), ConfigError> {
    if !is_path_safe_name(&config.name) {
        return Err(ConfigError::Validation(format!(
            "experiment name must be non-empty and contain only alphanumerics, '-', '_' or '.', got '{}'",
            config.name
        )));
    }
    Ok(())
}

/// Returns true if `name` can be used as a single directory component
pub fn is_path_safe_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
}

fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    match config.kind {
        FetcherKind::Corpus => {
            if config.corpus_path.is_none() {
                return Err(ConfigError::Validation(
                    "fetcher kind 'corpus' requires corpus-path".to_string(),
                ));
            }
        }
        FetcherKind::Http => match config.user_agent {
            Some(ref ua) => validate_user_agent_config(ua)?,
            None => {
                return Err(ConfigError::Validation(
                    "fetcher kind 'http' requires a [fetcher.user-agent] section".to_string(),
                ))
            }
        },
    }
    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

fn validate_seeds_config(config: &SeedsConfig, fetcher: FetcherKind) -> Result<(), ConfigError> {
    match config.strategy {
        SeedStrategy::List => {
            if config.urls.is_empty() && config.file.is_none() {
                return Err(ConfigError::Validation(
                    "seed strategy 'list' requires seeds.urls or seeds.file".to_string(),
                ));
            }
        }
        SeedStrategy::Random => {
            if fetcher != FetcherKind::Corpus {
                return Err(ConfigError::Validation(
                    "seed strategy 'random' samples from the corpus and requires fetcher kind 'corpus'"
                        .to_string(),
                ));
            }
            if config.count.unwrap_or(0) == 0 {
                return Err(ConfigError::Validation(
                    "seed strategy 'random' requires seeds.count >= 1".to_string(),
                ));
            }
        }
    }
    Ok(())
}

fn validate_oracle_config(
    config: Option<&OracleConfig>,
    frontier_type: FrontierType,
    fetcher: FetcherKind,
) -> Result<(), ConfigError> {
    let config = match config {
        Some(c) => c,
        None if frontier_type == FrontierType::OracleQuality => {
            return Err(ConfigError::Validation(
                "frontier type 'oracle-quality' requires an [oracle] section".to_string(),
            ))
        }
        None => return Ok(()),
    };

    for (name, value) in [
        ("default_score", config.default_score),
        ("seed_score", config.seed_score),
    ] {
        if !(0.0..=1.0).contains(&value) {
            return Err(ConfigError::Validation(format!(
                "{} must be within [0, 1], got {}",
                name, value
            )));
        }
    }

    if config.backend == OracleBackendKind::Table
        && config.scores_path.is_none()
        && fetcher != FetcherKind::Corpus
    {
        return Err(ConfigError::Validation(
            "oracle backend 'table' requires scores-path unless the corpus fetcher supplies quality scores"
                .to_string(),
        ));
    }

    Ok(())
}

fn validate_snapshot_config(config: &SnapshotConfig) -> Result<(), ConfigError> {
    if config.root.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "snapshot root cannot be empty".to_string(),
        ));
    }

    if config.every_n_pages == Some(0) {
        return Err(ConfigError::Validation(
            "every_n_pages must be >= 1 when set".to_string(),
        ));
    }

    if config.limits.iter().any(|&l| l == 0) {
        return Err(ConfigError::Validation(
            "snapshot limits must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_benchmarks(benchmarks: &[BenchmarkEntry]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for entry in benchmarks {
        if entry.name.is_empty() || entry.name == "all" {
            return Err(ConfigError::Validation(format!(
                "benchmark name must be non-empty and not 'all', got '{}'",
                entry.name
            )));
        }
        if !seen.insert(entry.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate benchmark name '{}'",
                entry.name
            )));
        }
    }
    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let (local, domain) = match email.split_once('@') {
        Some(parts) => parts,
        None => {
            return Err(ConfigError::Validation(format!(
                "Invalid email format: '{}'",
                email
            )))
        }
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
