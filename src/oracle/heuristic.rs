use crate::oracle::{OracleBackend, OracleError, OracleFeatures};
use crate::registry::UrlRecord;

const BASE_SCORE: f64 = 0.5;

const HTTPS_BONUS: f64 = 0.05;
const ANCHOR_BONUS: f64 = 0.05;
const HIGH_VALUE_BONUS: f64 = 0.15;
const LOW_VALUE_PENALTY: f64 = -0.15;
const DEEP_PATH_PENALTY: f64 = -0.05;
const QUERY_PARAM_PENALTY: f64 = -0.05;
const MAX_QUERY_PENALTY: f64 = -0.15;

/// Path depth beyond which every extra segment is penalized
const MAX_PATH_DEPTH: usize = 4;

/// Minimum anchor length (in characters) for the anchor bonus
const MIN_ANCHOR_LENGTH: usize = 3;

/// Weight of the popularity signal when inlinks are enabled
const INLINK_WEIGHT: f64 = 0.2;

/// Inlink count at which the popularity signal reaches one half
const INLINK_HALF_SATURATION: f64 = 3.0;

const HIGH_VALUE_WORDS: &[&str] = &[
    "article",
    "docs",
    "documentation",
    "guide",
    "learn",
    "manual",
    "news",
    "overview",
    "reference",
    "research",
    "tutorial",
    "wiki",
];

const LOW_VALUE_WORDS: &[&str] = &[
    "account", "ad", "ads", "advert", "affiliate", "banner", "cart", "checkout", "click",
    "cookie", "login", "logout", "promo", "redirect", "register", "share", "signin", "signup",
    "sponsor", "tracking",
];

/// Deterministic URL and anchor-text heuristic
///
/// Starts from a neutral score and applies small adjustments for the scheme,
/// path depth, query parameters and keywords in the path or anchor. With
/// `use_inlinks` the result is blended with a saturating function of the
/// discovering page's incoming-edge count. A URL is scored once, when first
/// found, so its own count is not yet informative; a page many others link to
/// lends that popularity to the links it carries.
#[derive(Debug, Clone, Default)]
pub struct HeuristicBackend {
    use_inlinks: bool,
}

impl HeuristicBackend {
    pub fn new(use_inlinks: bool) -> Self {
        Self { use_inlinks }
    }

    fn url_adjustment(record: &UrlRecord) -> f64 {
        let url = record.url.as_url();
        let mut adjustment = 0.0;

        if url.scheme() == "https" {
            adjustment += HTTPS_BONUS;
        }

        let depth = record.url.path_depth();
        if depth > MAX_PATH_DEPTH {
            adjustment += DEEP_PATH_PENALTY * (depth - MAX_PATH_DEPTH) as f64;
        }

        let params = url.query_pairs().count();
        adjustment += (QUERY_PARAM_PENALTY * params as f64).max(MAX_QUERY_PENALTY);

        adjustment + keyword_adjustment(url.path())
    }

    fn anchor_adjustment(anchor: &str) -> f64 {
        let anchor = anchor.trim();
        if anchor.chars().count() < MIN_ANCHOR_LENGTH {
            return 0.0;
        }
        ANCHOR_BONUS + keyword_adjustment(anchor)
    }
}

/// Bonus for a high-value word, penalty for a low-value word, at most one of each
fn keyword_adjustment(text: &str) -> f64 {
    let mut high = false;
    let mut low = false;

    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let word = word.to_lowercase();
        high |= HIGH_VALUE_WORDS.contains(&word.as_str());
        low |= LOW_VALUE_WORDS.contains(&word.as_str());
    }

    let mut adjustment = 0.0;
    if high {
        adjustment += HIGH_VALUE_BONUS;
    }
    if low {
        adjustment += LOW_VALUE_PENALTY;
    }
    adjustment
}

/// Maps an inlink count into `[0, 1)`, reaching 0.5 at the half-saturation point
fn popularity(inlinks: u32) -> f64 {
    let n = f64::from(inlinks);
    n / (n + INLINK_HALF_SATURATION)
}

impl OracleBackend for HeuristicBackend {
    fn name(&self) -> &str {
        "heuristic"
    }

    fn score(&self, record: &UrlRecord, features: &OracleFeatures<'_>) -> Result<f64, OracleError> {
        let mut score = BASE_SCORE + Self::url_adjustment(record);

        if let Some(anchor) = features.anchor_text {
            score += Self::anchor_adjustment(anchor);
        }

        score = score.clamp(0.0, 1.0);

        if let (true, Some(inlinks)) = (self.use_inlinks, features.parent_inlinks) {
            score = (1.0 - INLINK_WEIGHT) * score + INLINK_WEIGHT * popularity(inlinks);
        }

        Ok(score)
    }
}
